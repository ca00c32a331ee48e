//! Outbound Neighbor Discovery packet construction
//!
//! Builds the ICMPv6 body only. The checksum is left zero; the transport
//! (kernel raw socket) computes it at send time.

use crate::error::{NdError, Result};
use crate::interface::InterfaceIdentity;
use crate::wire::{
    ARO_DEFAULT_LIFETIME, ARO_OPTION_LEN, AroOption, ND_HEADER_LEN, ND_NA_FLAG_OVERRIDE,
    ND_NEIGHBOR_ADVERT, ND_NEIGHBOR_SOLICIT, encode_nd_header, pad8,
};
use std::net::Ipv6Addr;

/// Size of a self-announcement NS carrying an ARO, after padding
pub const NS_ARO_LEN: usize = pad8(ND_HEADER_LEN + ARO_OPTION_LEN);
/// Largest NA this crate emits (header plus ARO, padded)
pub const NA_MAX_LEN: usize = NS_ARO_LEN;

/// Node-wide settings used when this node speaks for itself on a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Registration lifetime placed in the ARO, in 60-second units
    pub aro_lifetime: u16,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            aro_lifetime: ARO_DEFAULT_LIFETIME,
        }
    }
}

impl DeviceIdentity {
    pub fn new(aro_lifetime: u16) -> Self {
        Self { aro_lifetime }
    }

    /// Build the NS/ARO this node uses to announce itself on `iface`.
    ///
    /// The buffer is zeroed first, so the padding bytes are zero. Returns the
    /// padded length; fails with [`NdError::BufferTooSmall`] instead of
    /// writing past `buf`.
    pub fn build_neighbor_solicit<I>(&self, iface: &I, buf: &mut [u8]) -> Result<usize>
    where
        I: InterfaceIdentity + ?Sized,
    {
        if buf.len() < NS_ARO_LEN {
            return Err(NdError::BufferTooSmall {
                required: NS_ARO_LEN,
                capacity: buf.len(),
            });
        }
        buf.fill(0);

        // The NA header layout is reused: the override flag sits in the
        // reserved word of a message typed NS. Peers depend on these bytes,
        // so they are kept even though RFC 4861 defines no flags for NS.
        let mut len = encode_nd_header(
            buf,
            ND_NEIGHBOR_SOLICIT,
            ND_NA_FLAG_OVERRIDE,
            &iface.link_local_address(),
        )?;

        let aro = AroOption::new(self.aro_lifetime, iface.eui64());
        len += aro.encode(&mut buf[len..])?;

        Ok(pad8(len))
    }
}

/// Build a Neighbor Advertisement for `target`, optionally carrying an ARO.
pub fn build_neighbor_advert(
    buf: &mut [u8],
    flags: u32,
    target: &Ipv6Addr,
    aro: Option<&AroOption>,
) -> Result<usize> {
    let required = pad8(ND_HEADER_LEN + aro.map_or(0, |_| ARO_OPTION_LEN));
    if buf.len() < required {
        return Err(NdError::BufferTooSmall {
            required,
            capacity: buf.len(),
        });
    }
    buf.fill(0);

    let mut len = encode_nd_header(buf, ND_NEIGHBOR_ADVERT, flags, target)?;
    if let Some(aro) = aro {
        len += aro.encode(&mut buf[len..])?;
    }

    Ok(pad8(len))
}
