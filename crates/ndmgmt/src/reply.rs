//! Reply strategies for classified Neighbor Solicitations
//!
//! The classifier picks a [`ReplyKind`] and hands a [`Reply`] to a
//! [`ReplySink`]. [`TransportReplies`] is the production sink: it answers
//! with a Neighbor Advertisement through a [`Transport`].

use crate::builder::{DeviceIdentity, NA_MAX_LEN, build_neighbor_advert};
use crate::cache::NeighborEntry;
use crate::interface::InterfaceIdentity;
use crate::transport::Transport;
use crate::wire::{
    AroOption, ND_NA_FLAG_OVERRIDE, ND_NA_FLAG_ROUTER, ND_NA_FLAG_SOLICITED, NeighborSolicit,
};
use rpl_types::ALL_NODES_MULTICAST;
use std::net::Ipv6Addr;
use std::time::Instant;
use tracing::{debug, warn};

/// Which answer the classifier selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Unicast NS to one of our addresses: confirm we are reachable
    UnicastReachability,
    /// NS to all-nodes: offer to assist a joining node
    JoinAssistant,
    /// NS to any other multicast group: plain advertisement
    MulticastAdvertise,
}

/// Everything a strategy needs to answer one solicitation.
#[derive(Debug, Clone)]
pub struct Reply<'a> {
    pub kind: ReplyKind,
    /// Source of the solicitation
    pub from: Ipv6Addr,
    /// Destination the solicitation was sent to
    pub to: Ipv6Addr,
    pub now: Instant,
    pub solicit: &'a NeighborSolicit,
    /// Cache entry for the target, present for the multicast kinds
    pub neighbor: Option<NeighborEntry>,
}

/// Capability that turns a classified solicitation into outbound traffic.
pub trait ReplySink {
    fn dispatch(&mut self, iface: &dyn InterfaceIdentity, reply: &Reply<'_>);
}

/// Answers solicitations with Neighbor Advertisements.
pub struct TransportReplies<'t> {
    transport: &'t mut dyn Transport,
    device: DeviceIdentity,
}

impl<'t> TransportReplies<'t> {
    pub fn new(transport: &'t mut dyn Transport, device: DeviceIdentity) -> Self {
        Self { transport, device }
    }
}

/// Destination and base flags for a reply to `from`. A solicitation from
/// the unspecified address (DAD) is answered to all-nodes with S clear
/// (RFC 4861 section 7.2.4).
fn reply_destination(from: Ipv6Addr) -> (Ipv6Addr, u32) {
    if from.is_unspecified() {
        (ALL_NODES_MULTICAST, ND_NA_FLAG_OVERRIDE)
    } else {
        (from, ND_NA_FLAG_SOLICITED | ND_NA_FLAG_OVERRIDE)
    }
}

impl ReplySink for TransportReplies<'_> {
    fn dispatch(&mut self, iface: &dyn InterfaceIdentity, reply: &Reply<'_>) {
        let (dest, src, flags, aro) = match reply.kind {
            ReplyKind::UnicastReachability => {
                let (dest, flags) = reply_destination(reply.from);
                (dest, reply.to, flags, None)
            }
            ReplyKind::MulticastAdvertise => {
                let (dest, flags) = reply_destination(reply.from);
                (dest, iface.link_local_address(), flags, None)
            }
            ReplyKind::JoinAssistant => {
                let (dest, flags) = reply_destination(reply.from);
                let aro = AroOption::new(self.device.aro_lifetime, iface.eui64());
                (
                    dest,
                    iface.link_local_address(),
                    flags | ND_NA_FLAG_ROUTER,
                    Some(aro),
                )
            }
        };

        let mut buf = [0u8; NA_MAX_LEN];
        match build_neighbor_advert(&mut buf, flags, &reply.solicit.target, aro.as_ref()) {
            Ok(len) => {
                debug!(
                    kind = ?reply.kind,
                    target = %reply.solicit.target,
                    %dest,
                    neighbor_valid = reply.neighbor.map(|n| n.is_valid()),
                    neighbor_ifindex = reply.neighbor.map(|n| n.ifindex()),
                    latency_us = reply.now.elapsed().as_micros() as u64,
                    "sending Neighbor Advertisement"
                );
                self.transport.send_raw_icmp(dest, src, &buf[..len]);
            }
            Err(e) => {
                warn!(kind = ?reply.kind, error = %e, "failed to build Neighbor Advertisement");
            }
        }
    }
}
