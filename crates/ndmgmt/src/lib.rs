//! Neighbor Discovery core for the RPL mesh routing daemon
//!
//! This crate handles inbound IPv6 Neighbor Solicitations on low-power mesh
//! interfaces and builds the Neighbor Solicitation / Address Registration
//! Option (ARO, RFC 6775) a node uses to announce itself on a link.
//!
//! # Features
//!
//! - **default**: std `HashMap` neighbor cache
//! - **perf-fxhash**: FxHashMap neighbor cache
//!
//! # NIST 800-53 Rev 5 Control Mappings
//!
//! | Control | Description | Implementation |
//! |---------|-------------|----------------|
//! | AU-3 | Content of Audit Records | Structured tracing with interface context |
//! | AU-6 | Audit Record Review | Diagnostic counters per event kind |
//! | CM-6 | Configuration Settings | TOML configuration with validation |
//! | CM-8 | System Component Inventory | Per-interface neighbor cache |
//! | IA-3 | Device Identification | EUI-64 carried in the ARO |
//! | SC-7 | Boundary Protection | Link-scoped raw ICMPv6, hop limit 255 |
//! | SI-4 | System Monitoring | Every solicitation classified and tallied |
//! | SI-10 | Input Validation | Length checked before any field access |
//! | SI-11 | Error Handling | Structured error types |
//!
//! # Architecture
//!
//! ```text
//! +-----------------+     +------------------------------+     +---------------+
//! |  raw ICMPv6     |     |        NsClassifier          |     |  ReplySink    |
//! |  (from, to,     |---->|  validate -> decode -> branch|---->| (NA builder + |
//! |   payload)      |     |       |            |         |     |  Transport)   |
//! +-----------------+     |       v            v         |     +---------------+
//!                         | DiagnosticCounters  NeighborCache
//!                         +------------------------------+
//!
//! NetworkInterface::send_ns -> DeviceIdentity::build_neighbor_solicit -> Transport
//! ```

pub mod builder;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod counters;
pub mod error;
pub mod hexfile;
pub mod interface;
pub mod reply;
pub mod transport;
pub mod wire;

#[cfg(test)]
mod test_support;

pub use builder::{DeviceIdentity, NA_MAX_LEN, NS_ARO_LEN, build_neighbor_advert};
pub use cache::{NeighborCache, NeighborEntry};
pub use classifier::{Disposition, NsClassifier};
pub use config::{DEFAULT_CONFIG_PATH, InterfaceConfig, NdConfig};
pub use counters::{CounterSnapshot, DiagnosticCounters, EventKind};
pub use error::{NdError, Result};
pub use interface::{InterfaceIdentity, NetworkInterface};
pub use reply::{Reply, ReplyKind, ReplySink, TransportReplies};
#[cfg(target_os = "linux")]
pub use transport::RawIcmpTransport;
pub use transport::{RecordingTransport, SentPacket, Transport, hexdump};
pub use wire::{AroOption, NeighborSolicit};
