//! Error types for the Neighbor Discovery core
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-10: Information Input Validation - Short packets are rejected before field access
//! - SI-11: Error Handling - Structured error types with contextual information

use thiserror::Error;

/// Errors that can occur in the Neighbor Discovery core
///
/// Per-packet failures never escape the receive path; they are logged and
/// the packet is dropped. The variants below surface to callers that build
/// packets, load configuration or open transports.
#[derive(Debug, Error)]
pub enum NdError {
    /// An inbound ND message is shorter than its fixed header
    /// NIST: SI-10 - Input validation
    #[error("{label} packet too short: {actual} bytes, need {required}")]
    PacketTooShort {
        label: &'static str,
        actual: usize,
        required: usize,
    },

    /// Caller-supplied buffer cannot hold the encoded packet
    #[error("buffer too small: need {required} bytes, have {capacity}")]
    BufferTooSmall { required: usize, capacity: usize },

    /// Interface lookup failed
    /// NIST: CM-8 (System Component Inventory) - Interface tracking
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    /// Configuration error
    /// NIST: CM-6 (Configuration Settings) - Configuration validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Packet data file contains something other than hex octets
    #[error("invalid hex data on line {line}: {token:?}")]
    InvalidHex { line: usize, token: String },

    /// EUI-64 or other shared type failed to parse
    #[error("Parse error: {0}")]
    Parse(#[from] rpl_types::ParseError),

    /// Diagnostic counter registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    /// NIST: SI-11 (Error Handling) - System-level errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Neighbor Discovery operations
pub type Result<T> = std::result::Result<T, NdError>;
