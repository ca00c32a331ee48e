//! ICMPv6 transmission
//!
//! The ND core hands finished ICMPv6 bodies to a [`Transport`] and never
//! looks at the outcome. Sends are fire-and-forget; failures are logged by
//! the transport itself.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SC-7: Boundary Protection - Link-scoped raw socket, hop limit 255
//! - AU-12: Audit Record Generation - Every outbound packet is logged

use std::fmt::Write as _;
use std::net::Ipv6Addr;
use tracing::debug;

/// Sends raw ICMPv6 bodies; the checksum is computed below this layer.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    fn send_raw_icmp(&mut self, dest: Ipv6Addr, src: Ipv6Addr, bytes: &[u8]);
}

/// A packet captured by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    pub dest: Ipv6Addr,
    pub src: Ipv6Addr,
    pub bytes: Vec<u8>,
}

/// In-memory transport used by simulated interfaces and tests.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Vec<SentPacket>,
}

impl RecordingTransport {
    pub fn sent(&self) -> &[SentPacket] {
        &self.sent
    }

    pub fn take(&mut self) -> Vec<SentPacket> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for RecordingTransport {
    fn send_raw_icmp(&mut self, dest: Ipv6Addr, src: Ipv6Addr, bytes: &[u8]) {
        debug!(%dest, %src, len = bytes.len(), "recorded ICMPv6 packet");
        self.sent.push(SentPacket {
            dest,
            src,
            bytes: bytes.to_vec(),
        });
    }
}

/// Classic 16-bytes-per-line hex dump with offsets.
pub fn hexdump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (line, chunk) in bytes.chunks(16).enumerate() {
        let _ = write!(out, "{:04x}:", line * 16);
        for (i, b) in chunk.iter().enumerate() {
            if i == 8 {
                out.push(' ');
            }
            let _ = write!(out, " {:02x}", b);
        }
        out.push('\n');
    }
    out
}

#[cfg(target_os = "linux")]
pub use linux::RawIcmpTransport;

#[cfg(target_os = "linux")]
mod linux {
    use super::Transport;
    use crate::error::{NdError, Result};
    use std::mem::{size_of, zeroed};
    use std::net::Ipv6Addr;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
    use tracing::{debug, instrument, warn};

    /// ND messages must arrive with hop limit 255 (RFC 4861 section 7.1)
    const ND_HOP_LIMIT: libc::c_int = 255;

    /// Raw ICMPv6 socket bound to one interface.
    ///
    /// Requires CAP_NET_RAW. The kernel fills in the ICMPv6 checksum for
    /// raw sockets of this protocol.
    pub struct RawIcmpTransport {
        socket: OwnedFd,
        ifindex: u32,
    }

    impl RawIcmpTransport {
        #[instrument]
        pub fn open(ifindex: u32) -> Result<Self> {
            let fd = unsafe {
                libc::socket(
                    libc::AF_INET6,
                    libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                    libc::IPPROTO_ICMPV6,
                )
            };
            if fd < 0 {
                return Err(NdError::Io(std::io::Error::last_os_error()));
            }
            let socket = unsafe { OwnedFd::from_raw_fd(fd) };

            let transport = Self { socket, ifindex };
            transport.set_option(libc::IPV6_UNICAST_HOPS, ND_HOP_LIMIT)?;
            transport.set_option(libc::IPV6_MULTICAST_HOPS, ND_HOP_LIMIT)?;
            transport.set_option(libc::IPV6_MULTICAST_IF, ifindex as libc::c_int)?;

            debug!(ifindex, "raw ICMPv6 socket open");
            Ok(transport)
        }

        fn set_option(&self, option: libc::c_int, value: libc::c_int) -> Result<()> {
            let ret = unsafe {
                libc::setsockopt(
                    self.socket.as_raw_fd(),
                    libc::IPPROTO_IPV6,
                    option,
                    &value as *const _ as *const libc::c_void,
                    size_of::<libc::c_int>() as libc::socklen_t,
                )
            };
            if ret < 0 {
                return Err(NdError::Io(std::io::Error::last_os_error()));
            }
            Ok(())
        }

        fn send(&self, dest: Ipv6Addr, src: Ipv6Addr, bytes: &[u8]) -> std::io::Result<usize> {
            let mut addr: libc::sockaddr_in6 = unsafe { zeroed() };
            addr.sin6_family = libc::AF_INET6 as libc::sa_family_t;
            addr.sin6_addr = libc::in6_addr {
                s6_addr: dest.octets(),
            };
            addr.sin6_scope_id = self.ifindex;

            // Source address and outgoing interface travel as IPV6_PKTINFO.
            let info = libc::in6_pktinfo {
                ipi6_addr: libc::in6_addr {
                    s6_addr: src.octets(),
                },
                ipi6_ifindex: self.ifindex,
            };
            let space = unsafe { libc::CMSG_SPACE(size_of::<libc::in6_pktinfo>() as u32) };
            let mut control = vec![0u8; space as usize];

            let mut iov = libc::iovec {
                iov_base: bytes.as_ptr() as *mut libc::c_void,
                iov_len: bytes.len(),
            };

            let mut msg: libc::msghdr = unsafe { zeroed() };
            msg.msg_name = &mut addr as *mut _ as *mut libc::c_void;
            msg.msg_namelen = size_of::<libc::sockaddr_in6>() as libc::socklen_t;
            msg.msg_iov = &mut iov;
            msg.msg_iovlen = 1;
            msg.msg_control = control.as_mut_ptr() as *mut libc::c_void;
            msg.msg_controllen = space as _;

            let sent = unsafe {
                let cmsg = libc::CMSG_FIRSTHDR(&msg);
                (*cmsg).cmsg_level = libc::IPPROTO_IPV6;
                (*cmsg).cmsg_type = libc::IPV6_PKTINFO;
                (*cmsg).cmsg_len = libc::CMSG_LEN(size_of::<libc::in6_pktinfo>() as u32) as _;
                std::ptr::write_unaligned(libc::CMSG_DATA(cmsg) as *mut libc::in6_pktinfo, info);

                libc::sendmsg(self.socket.as_raw_fd(), &msg, 0)
            };
            if sent < 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(sent as usize)
        }
    }

    impl Transport for RawIcmpTransport {
        fn send_raw_icmp(&mut self, dest: Ipv6Addr, src: Ipv6Addr, bytes: &[u8]) {
            match self.send(dest, src, bytes) {
                Ok(len) => debug!(%dest, %src, len, ifindex = self.ifindex, "sent ICMPv6 packet"),
                Err(e) => warn!(%dest, %src, ifindex = self.ifindex, error = %e, "ICMPv6 send failed"),
            }
        }
    }
}
