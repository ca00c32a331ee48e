//! Local network interface state
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - CM-8: System Component Inventory - Interface identity and its neighbors
//! - IA-3: Device Identification - EUI-64 carried in address registrations

use crate::builder::{DeviceIdentity, NS_ARO_LEN};
use crate::cache::{NeighborCache, NeighborEntry};
use crate::error::Result;
use crate::transport::Transport;
use rpl_types::{ALL_NODES_MULTICAST, Eui64, link_local_from_eui64};
use std::net::Ipv6Addr;
use tracing::{info, instrument};

/// What the ND core needs to know about the interface it runs on.
#[cfg_attr(test, mockall::automock)]
pub trait InterfaceIdentity {
    /// Kernel interface index
    fn index(&self) -> u32;

    /// Link-local address written into self-announcements
    fn link_local_address(&self) -> Ipv6Addr;

    /// Hardware identity carried in the ARO
    fn eui64(&self) -> Eui64;

    /// True if `addr` is one of this interface's own unicast addresses
    fn matching_address(&self, addr: &Ipv6Addr) -> bool;

    /// True if `addr` is the link's all-nodes multicast group
    fn all_hosts_address_match(&self, addr: &Ipv6Addr) -> bool;
}

/// A local interface and the neighbors learned through it.
#[derive(Debug)]
pub struct NetworkInterface {
    name: String,
    index: u32,
    link_local: Ipv6Addr,
    eui64: Eui64,
    addresses: Vec<Ipv6Addr>,
    faked: bool,
    neighbors: NeighborCache,
}

impl NetworkInterface {
    /// New interface whose link-local address is derived from `eui64`
    pub fn new(name: impl Into<String>, index: u32, eui64: Eui64) -> Self {
        Self {
            name: name.into(),
            index,
            link_local: link_local_from_eui64(&eui64),
            eui64,
            addresses: Vec::new(),
            faked: false,
            neighbors: NeighborCache::new(),
        }
    }

    pub fn with_link_local(mut self, link_local: Ipv6Addr) -> Self {
        self.link_local = link_local;
        self
    }

    /// Add a configured unicast address
    pub fn with_address(mut self, addr: Ipv6Addr) -> Self {
        if !self.addresses.contains(&addr) {
            self.addresses.push(addr);
        }
        self
    }

    /// Mark as a simulated interface (packets are recorded, not sent)
    pub fn with_faked(mut self, faked: bool) -> Self {
        self.faked = faked;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_faked(&self) -> bool {
        self.faked
    }

    pub fn addresses(&self) -> &[Ipv6Addr] {
        &self.addresses
    }

    pub fn neighbors(&self) -> &NeighborCache {
        &self.neighbors
    }

    /// Neighbor entry for `addr`, created invalid if unknown
    pub fn find_or_create(&mut self, addr: Ipv6Addr) -> &mut NeighborEntry {
        self.neighbors.find_or_create(addr)
    }

    /// Find-or-create `addr` and mark it valid on this interface
    pub fn mark_neighbor_valid(&mut self, addr: Ipv6Addr) -> &NeighborEntry {
        self.neighbors.mark_valid(self.index, addr)
    }

    /// Announce this node on the link: NS/ARO from `::` to all-nodes.
    ///
    /// The unspecified source lets a node announce itself before its own
    /// address configuration has finished.
    #[instrument(skip_all, fields(interface = %self.name))]
    pub fn send_ns(&self, device: &DeviceIdentity, transport: &mut dyn Transport) -> Result<usize> {
        info!(
            "sending Neighbor Solicitation on if: {}{}",
            self.name,
            if self.faked { "(faked)" } else { "" }
        );

        let mut icmp_body = [0u8; NS_ARO_LEN];
        let icmp_len = device.build_neighbor_solicit(self, &mut icmp_body)?;

        transport.send_raw_icmp(ALL_NODES_MULTICAST, Ipv6Addr::UNSPECIFIED, &icmp_body[..icmp_len]);
        Ok(icmp_len)
    }
}

impl InterfaceIdentity for NetworkInterface {
    fn index(&self) -> u32 {
        self.index
    }

    fn link_local_address(&self) -> Ipv6Addr {
        self.link_local
    }

    fn eui64(&self) -> Eui64 {
        self.eui64
    }

    fn matching_address(&self, addr: &Ipv6Addr) -> bool {
        *addr == self.link_local || self.addresses.contains(addr)
    }

    fn all_hosts_address_match(&self, addr: &Ipv6Addr) -> bool {
        *addr == ALL_NODES_MULTICAST
    }
}
