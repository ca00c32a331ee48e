//! EUI-64 hardware identity with safe parsing and formatting.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 64-bit IEEE EUI-64 identifier.
///
/// 6LoWPAN nodes register their addresses with a routing neighbor using this
/// identity, so it has to be stable across address changes.
///
/// # Examples
///
/// ```
/// use rpl_types::Eui64;
///
/// let eui: Eui64 = "00:11:22:ff:fe:33:44:55".parse().unwrap();
/// assert_eq!(eui.to_string(), "00:11:22:ff:fe:33:44:55");
///
/// // Also supports hyphen-separated format
/// let eui2: Eui64 = "00-11-22-ff-fe-33-44-55".parse().unwrap();
/// assert_eq!(eui, eui2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Eui64([u8; 8]);

impl Eui64 {
    /// The all-zero identity, used by interfaces that have no hardware address.
    pub const ZERO: Eui64 = Eui64([0; 8]);

    /// Creates an EUI-64 from raw bytes.
    pub const fn new(bytes: [u8; 8]) -> Self {
        Eui64(bytes)
    }

    /// Returns the raw bytes, in transmission order.
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Builds the modified EUI-64 of a 48-bit MAC (RFC 4291 appendix A):
    /// `ff:fe` is inserted in the middle. The universal/local bit is left
    /// alone here; [`Eui64::interface_id`] flips it.
    pub const fn from_mac(mac: [u8; 6]) -> Self {
        Eui64([mac[0], mac[1], mac[2], 0xff, 0xfe, mac[3], mac[4], mac[5]])
    }

    /// Interface identifier for address autoconfiguration (U/L bit inverted).
    pub const fn interface_id(&self) -> [u8; 8] {
        let mut id = self.0;
        id[0] ^= 0x02;
        id
    }

    /// Returns true if every byte is zero.
    pub const fn is_zero(&self) -> bool {
        u64::from_be_bytes(self.0) == 0
    }
}

impl fmt::Display for Eui64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5], self.0[6], self.0[7]
        )
    }
}

impl FromStr for Eui64 {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = if s.contains(':') { ':' } else { '-' };

        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 8 {
            return Err(ParseError::InvalidEui64(s.to_string()));
        }

        let mut bytes = [0u8; 8];
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || part.len() > 2 {
                return Err(ParseError::InvalidEui64(s.to_string()));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| ParseError::InvalidEui64(s.to_string()))?;
        }

        Ok(Eui64(bytes))
    }
}

impl TryFrom<String> for Eui64 {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Eui64> for String {
    fn from(eui: Eui64) -> String {
        eui.to_string()
    }
}

impl From<[u8; 8]> for Eui64 {
    fn from(bytes: [u8; 8]) -> Self {
        Eui64(bytes)
    }
}

impl From<Eui64> for [u8; 8] {
    fn from(eui: Eui64) -> [u8; 8] {
        eui.0
    }
}
