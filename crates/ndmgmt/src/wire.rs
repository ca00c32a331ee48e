//! ICMPv6 Neighbor Discovery wire format
//!
//! Explicit encode/decode over byte slices. Every field access is preceded
//! by a length check; buffers are never reinterpreted as typed headers.
//!
//! ```text
//!  0      1      2             4                           8
//! +------+------+-------------+---------------------------+
//! | type | code |  checksum   |  flags / reserved         |
//! +------+------+-------------+---------------------------+
//! |                 target address (16)                   |
//! +------+------+------+------+-------------+-------------+
//! | ARO  | len  |status| rsvd |  lifetime   |  EUI-64 ... |
//! +------+------+------+------+-------------+-------------+
//! ```

use crate::error::{NdError, Result};
use byteorder::{BigEndian, ByteOrder};
use rpl_types::Eui64;
use std::net::Ipv6Addr;
use tracing::warn;

/// ICMPv6 Neighbor Solicitation
pub const ND_NEIGHBOR_SOLICIT: u8 = 135;
/// ICMPv6 Neighbor Advertisement
pub const ND_NEIGHBOR_ADVERT: u8 = 136;
/// 6LoWPAN Address Registration Option (RFC 6775)
pub const ND_OPT_ARO: u8 = 33;

/// NA flag bits in the flags/reserved word
pub const ND_NA_FLAG_ROUTER: u32 = 0x8000_0000;
pub const ND_NA_FLAG_SOLICITED: u32 = 0x4000_0000;
pub const ND_NA_FLAG_OVERRIDE: u32 = 0x2000_0000;

/// type + code + checksum + flags/reserved + target
pub const ND_HEADER_LEN: usize = 24;
/// type + length + status + reserved + lifetime + EUI-64
pub const ARO_OPTION_LEN: usize = 14;
/// Registration lifetime carried by self-announcements, in 60 s units
pub const ARO_DEFAULT_LIFETIME: u16 = 0xffff;

/// Round `len` up to the next 64-bit boundary
#[inline]
pub const fn pad8(len: usize) -> usize {
    (len + 7) & !7
}

/// Returns true (and logs) when `actual` is below `required`.
///
/// Callers abort processing of the packet on true; nothing past the header
/// may be read.
pub fn packet_too_short(label: &str, actual: usize, required: usize) -> bool {
    if actual < required {
        warn!(label, actual, required, "packet too short");
        return true;
    }
    false
}

/// Decoded Neighbor Solicitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborSolicit {
    pub msg_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub reserved: u32,
    pub target: Ipv6Addr,
    /// Option bytes after the fixed header, undecoded
    pub options: Vec<u8>,
}

impl NeighborSolicit {
    /// Decode the fixed header. The type and code bytes are taken as-is;
    /// structural checks beyond the length are the caller's business.
    ///
    /// A short buffer is logged through [`packet_too_short`] and rejected
    /// before any field is read.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if packet_too_short("ns", buf.len(), ND_HEADER_LEN) {
            return Err(NdError::PacketTooShort {
                label: "ns",
                actual: buf.len(),
                required: ND_HEADER_LEN,
            });
        }

        let mut target = [0u8; 16];
        target.copy_from_slice(&buf[8..24]);

        Ok(Self {
            msg_type: buf[0],
            code: buf[1],
            checksum: BigEndian::read_u16(&buf[2..4]),
            reserved: BigEndian::read_u32(&buf[4..8]),
            target: Ipv6Addr::from(target),
            options: buf[ND_HEADER_LEN..].to_vec(),
        })
    }

    /// Encode a solicitation for `target` with no options (checksum zero)
    pub fn encode(target: &Ipv6Addr, buf: &mut [u8]) -> Result<usize> {
        encode_nd_header(buf, ND_NEIGHBOR_SOLICIT, 0, target)
    }
}

/// Write the 24-byte ND header shared by NS and NA. Checksum is left zero;
/// the transport fills it in at send time.
pub fn encode_nd_header(
    buf: &mut [u8],
    msg_type: u8,
    flags: u32,
    target: &Ipv6Addr,
) -> Result<usize> {
    check_capacity(buf, ND_HEADER_LEN)?;

    buf[0] = msg_type;
    buf[1] = 0;
    BigEndian::write_u16(&mut buf[2..4], 0);
    BigEndian::write_u32(&mut buf[4..8], flags);
    buf[8..24].copy_from_slice(&target.octets());

    Ok(ND_HEADER_LEN)
}

/// Address Registration Option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AroOption {
    pub status: u8,
    pub lifetime: u16,
    pub eui64: Eui64,
}

impl AroOption {
    /// Value of the option length byte.
    ///
    /// Counts the bytes after the first 8 in 32-bit units. This is what
    /// deployed peers expect; it is not the 8-octet unit of RFC 4861.
    pub const LENGTH_FIELD: u8 = ((ARO_OPTION_LEN - 8) / 4) as u8;

    pub fn new(lifetime: u16, eui64: Eui64) -> Self {
        Self {
            status: 0,
            lifetime,
            eui64,
        }
    }

    /// Write the option at the start of `buf`, returning its size
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        check_capacity(buf, ARO_OPTION_LEN)?;

        buf[0] = ND_OPT_ARO;
        buf[1] = Self::LENGTH_FIELD;
        buf[2] = self.status;
        buf[3] = 0;
        BigEndian::write_u16(&mut buf[4..6], self.lifetime);
        buf[6..14].copy_from_slice(self.eui64.as_bytes());

        Ok(ARO_OPTION_LEN)
    }

    /// Decode an option previously written by [`AroOption::encode`]
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < ARO_OPTION_LEN {
            return Err(NdError::PacketTooShort {
                label: "aro",
                actual: buf.len(),
                required: ARO_OPTION_LEN,
            });
        }
        let mut eui = [0u8; 8];
        eui.copy_from_slice(&buf[6..14]);
        Ok(Self {
            status: buf[2],
            lifetime: BigEndian::read_u16(&buf[4..6]),
            eui64: Eui64::new(eui),
        })
    }
}

fn check_capacity(buf: &[u8], required: usize) -> Result<()> {
    if buf.len() < required {
        return Err(NdError::BufferTooSmall {
            required,
            capacity: buf.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pad8() {
        assert_eq!(pad8(0), 0);
        assert_eq!(pad8(1), 8);
        assert_eq!(pad8(24), 24);
        assert_eq!(pad8(ND_HEADER_LEN + ARO_OPTION_LEN), 40);
    }

    #[test]
    fn test_packet_too_short() {
        assert!(packet_too_short("ns", 4, ND_HEADER_LEN));
        assert!(packet_too_short("ns", 23, ND_HEADER_LEN));
        assert!(!packet_too_short("ns", 24, ND_HEADER_LEN));
        assert!(!packet_too_short("ns", 64, ND_HEADER_LEN));
    }

    #[test]
    fn test_decode_solicit() {
        let mut buf = [0u8; 32];
        buf[0] = ND_NEIGHBOR_SOLICIT;
        buf[2] = 0xab;
        buf[3] = 0xcd;
        buf[8..24].copy_from_slice(&"fe80::1234".parse::<Ipv6Addr>().unwrap().octets());
        buf[24] = 1;

        let ns = NeighborSolicit::decode(&buf).unwrap();
        assert_eq!(ns.msg_type, ND_NEIGHBOR_SOLICIT);
        assert_eq!(ns.checksum, 0xabcd);
        assert_eq!(ns.target, "fe80::1234".parse::<Ipv6Addr>().unwrap());
        assert_eq!(ns.options.len(), 8);
        assert_eq!(ns.options[0], 1);
    }

    #[test]
    fn test_decode_short_solicit() {
        let err = NeighborSolicit::decode(&[0u8; 4]).unwrap_err();
        assert!(matches!(
            err,
            NdError::PacketTooShort {
                actual: 4,
                required: ND_HEADER_LEN,
                ..
            }
        ));
    }

    #[test]
    fn test_encode_header_layout() {
        let mut buf = [0xffu8; ND_HEADER_LEN];
        let target: Ipv6Addr = "2001:db8::5".parse().unwrap();
        let len = encode_nd_header(&mut buf, ND_NEIGHBOR_ADVERT, ND_NA_FLAG_OVERRIDE, &target)
            .unwrap();

        assert_eq!(len, ND_HEADER_LEN);
        assert_eq!(&buf[..8], &[136, 0, 0, 0, 0x20, 0, 0, 0]);
        assert_eq!(&buf[8..24], &target.octets());
    }

    #[test]
    fn test_encode_header_capacity() {
        let mut buf = [0u8; 10];
        let err = encode_nd_header(&mut buf, ND_NEIGHBOR_SOLICIT, 0, &Ipv6Addr::UNSPECIFIED)
            .unwrap_err();
        assert!(matches!(
            err,
            NdError::BufferTooSmall {
                required: 24,
                capacity: 10
            }
        ));
    }

    #[test]
    fn test_aro_layout() {
        let eui: Eui64 = "00:11:22:ff:fe:33:44:55".parse().unwrap();
        let aro = AroOption::new(0x0102, eui);
        let mut buf = [0u8; ARO_OPTION_LEN];
        assert_eq!(aro.encode(&mut buf).unwrap(), ARO_OPTION_LEN);

        assert_eq!(
            buf,
            [33, 1, 0, 0, 0x01, 0x02, 0x00, 0x11, 0x22, 0xff, 0xfe, 0x33, 0x44, 0x55]
        );
        assert_eq!(AroOption::decode(&buf).unwrap(), aro);
    }

    #[test]
    fn test_solicit_encode_then_decode_target() {
        let mut buf = [0u8; ND_HEADER_LEN];
        let target: Ipv6Addr = "fe80::77".parse().unwrap();
        NeighborSolicit::encode(&target, &mut buf).unwrap();
        let ns = NeighborSolicit::decode(&buf).unwrap();
        assert_eq!(ns.msg_type, ND_NEIGHBOR_SOLICIT);
        assert_eq!(ns.target, target);
        assert_eq!(ns.reserved, 0);
        assert!(ns.options.is_empty());
    }
}
