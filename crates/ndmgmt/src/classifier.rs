//! Neighbor Solicitation classifier
//!
//! Per-packet decision tree over the destination address:
//!
//! 1. destination is one of our unicast addresses: reachability probe,
//!    answered with a unicast NA (RFC 4861 section 4.3)
//! 2. destination is multicast: the target is learned into the cache and
//!    answered with a join-assistant reply (all-nodes) or a plain multicast
//!    advertisement (any other group)
//! 3. anything else is counted and dropped
//!
//! No state survives between packets except the neighbor cache and the
//! counters.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-4: System Monitoring - Every solicitation is tallied by outcome
//! - SI-10: Information Input Validation - Length checked before field access

use crate::counters::{DiagnosticCounters, EventKind};
use crate::interface::{InterfaceIdentity, NetworkInterface};
use crate::reply::{Reply, ReplyKind, ReplySink};
use crate::wire::NeighborSolicit;
use rpl_types::{is_multicast, is_solicited_node_for};
use std::net::Ipv6Addr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Outcome of classifying one solicitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Shorter than the NS header; nothing was read or changed
    TooShort,
    /// Unicast probe to one of our addresses
    UnicastReachability { target_is_self: bool },
    /// Sent to all-nodes; target learned, join-assistant reply issued
    JoinAssistant,
    /// Sent to another multicast group; target learned, NA issued
    MulticastSolicit,
    /// Matched no branch
    Ignored,
}

/// Classifies inbound Neighbor Solicitations for any number of interfaces.
///
/// The classifier holds no per-interface state; each call borrows the
/// receiving interface mutably, so one interface's cache is only ever
/// touched by its own processing path.
#[derive(Clone)]
pub struct NsClassifier {
    counters: Arc<DiagnosticCounters>,
    strict_solicited_node: bool,
}

impl NsClassifier {
    pub fn new(counters: Arc<DiagnosticCounters>) -> Self {
        Self {
            counters,
            strict_solicited_node: false,
        }
    }

    /// Only accept non-all-nodes multicast destinations that are the
    /// solicited-node group of the target. Off by default: any multicast
    /// destination is then taken as a solicited-node probe.
    pub fn with_strict_solicited_node(mut self, strict: bool) -> Self {
        self.strict_solicited_node = strict;
        self
    }

    pub fn counters(&self) -> &DiagnosticCounters {
        &self.counters
    }

    /// Classify one NS received on `iface` and dispatch at most one reply.
    #[instrument(skip_all, fields(interface = %iface.name(), from = %from, to = %to, len = payload.len()))]
    pub fn receive_neighbor_solicit(
        &self,
        iface: &mut NetworkInterface,
        from: Ipv6Addr,
        to: Ipv6Addr,
        now: Instant,
        payload: &[u8],
        replies: &mut dyn ReplySink,
    ) -> Disposition {
        debug!("processing NS({})", payload.len());

        // The only decode failure is a payload shorter than the NS header.
        let Ok(ns) = NeighborSolicit::decode(payload) else {
            return Disposition::TooShort;
        };

        self.counters.increment(EventKind::NeighborSolicitReceived);

        if iface.matching_address(&to) {
            let target_is_self = iface.matching_address(&ns.target);
            if target_is_self {
                self.counters.increment(EventKind::UnicastTargetIsSelf);
            }
            self.counters
                .increment(EventKind::UnicastReachabilityRequest);

            debug!(target = %ns.target, target_is_self, "unicast reachability probe");
            replies.dispatch(
                &*iface,
                &Reply {
                    kind: ReplyKind::UnicastReachability,
                    from,
                    to,
                    now,
                    solicit: &ns,
                    neighbor: None,
                },
            );
            return Disposition::UnicastReachability { target_is_self };
        }

        if is_multicast(&to) {
            let join_assistant = iface.all_hosts_address_match(&to);

            if !join_assistant
                && self.strict_solicited_node
                && !is_solicited_node_for(&to, &ns.target)
            {
                debug!(target = %ns.target, "multicast NS not sent to target's solicited-node group");
                self.counters.increment(EventKind::Ignored);
                return Disposition::Ignored;
            }

            // A multicast NS is taken as proof the peer is on the link; there
            // is no challenge before the entry becomes valid.
            let neighbor = *iface.mark_neighbor_valid(ns.target);

            let (kind, event, disposition) = if join_assistant {
                (
                    ReplyKind::JoinAssistant,
                    EventKind::MulticastJoinAssistantSolicit,
                    Disposition::JoinAssistant,
                )
            } else {
                (
                    ReplyKind::MulticastAdvertise,
                    EventKind::MulticastSolicit,
                    Disposition::MulticastSolicit,
                )
            };
            self.counters.increment(event);

            debug!(target = %ns.target, ?kind, "multicast solicitation");
            replies.dispatch(
                &*iface,
                &Reply {
                    kind,
                    from,
                    to,
                    now,
                    solicit: &ns,
                    neighbor: Some(neighbor),
                },
            );
            return disposition;
        }

        debug!(target = %ns.target, "NS to foreign unicast address ignored");
        self.counters.increment(EventKind::Ignored);
        Disposition::Ignored
    }
}
