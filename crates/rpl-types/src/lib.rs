//! Common RPL mesh types shared by the routing daemon crates.
//!
//! - [`Eui64`]: 64-bit hardware identity carried in 6LoWPAN address registrations
//! - IPv6 link-scope helpers: the all-nodes group, solicited-node groups and
//!   link-local derivation from an EUI-64

mod eui64;
mod ip;

pub use eui64::Eui64;
pub use ip::{
    ALL_NODES_MULTICAST, is_link_local, is_multicast, is_solicited_node_for,
    link_local_from_eui64, solicited_node_multicast,
};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid EUI-64 format: {0}")]
    InvalidEui64(String),
}
