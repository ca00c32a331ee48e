//! Per-interface neighbor cache
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-8: System Component Inventory - Track mesh neighbors per interface
//! - IA-3: Device Identification - Neighbors keyed by IPv6 address
//!
//! # Performance
//! When `perf-fxhash` feature is enabled, uses FxHashMap for faster lookups.

#[cfg(not(feature = "perf-fxhash"))]
use std::collections::HashMap;
use std::net::Ipv6Addr;
use tracing::debug;

#[cfg(feature = "perf-fxhash")]
use rustc_hash::FxHashMap as HashMap;

/// Neighbor record held by an interface's cache.
///
/// `valid` only ever moves from false to true; there is no way to
/// invalidate an entry short of dropping the whole cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborEntry {
    address: Ipv6Addr,
    valid: bool,
    ifindex: u32,
}

impl NeighborEntry {
    fn placeholder(address: Ipv6Addr) -> Self {
        Self {
            address,
            valid: false,
            ifindex: 0,
        }
    }

    /// Neighbor address (cache key)
    pub fn address(&self) -> Ipv6Addr {
        self.address
    }

    /// Whether a confirming event has been seen
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Index of the interface that learned this neighbor (0 until valid)
    pub fn ifindex(&self) -> u32 {
        self.ifindex
    }

    /// Mark the neighbor as confirmed on `ifindex`. No-op if already valid.
    pub fn mark_valid(&mut self, ifindex: u32) {
        if self.valid {
            return;
        }
        self.valid = true;
        self.ifindex = ifindex;
        debug!(neighbor = %self.address, ifindex, "neighbor marked valid");
    }
}

/// Address → neighbor mapping owned by one interface.
#[derive(Debug, Default)]
pub struct NeighborCache {
    entries: HashMap<Ipv6Addr, NeighborEntry>,
}

impl NeighborCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `address`, inserting an invalid placeholder if absent
    pub fn find_or_create(&mut self, address: Ipv6Addr) -> &mut NeighborEntry {
        self.entries
            .entry(address)
            .or_insert_with(|| NeighborEntry::placeholder(address))
    }

    /// Find-or-create `address` and mark it valid on `ifindex`
    pub fn mark_valid(&mut self, ifindex: u32, address: Ipv6Addr) -> &NeighborEntry {
        let entry = self.find_or_create(address);
        entry.mark_valid(ifindex);
        entry
    }

    /// Look up without creating
    pub fn get(&self, address: &Ipv6Addr) -> Option<&NeighborEntry> {
        self.entries.get(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NeighborEntry> {
        self.entries.values()
    }
}
