//! Diagnostic counters for Neighbor Solicitation handling
//!
//! One table is shared by every interface (wrap it in an `Arc`). Each event
//! kind is a prometheus integer counter, so increments are atomic and a
//! multi-interface daemon can classify on several threads without losing
//! updates.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-6: Audit Record Review - Counters available for analysis
//! - SI-4: System Monitoring - Per-event-kind tallies

use crate::error::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

/// Kind of event tallied by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A Neighbor Solicitation passed length validation
    NeighborSolicitReceived,
    /// Unicast NS whose target is also one of our addresses
    UnicastTargetIsSelf,
    /// Unicast NS addressed to us (reachability probe)
    UnicastReachabilityRequest,
    /// NS sent to the all-nodes group
    MulticastJoinAssistantSolicit,
    /// NS sent to any other multicast group
    MulticastSolicit,
    /// NS that matched no branch
    Ignored,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::NeighborSolicitReceived,
        EventKind::UnicastTargetIsSelf,
        EventKind::UnicastReachabilityRequest,
        EventKind::MulticastJoinAssistantSolicit,
        EventKind::MulticastSolicit,
        EventKind::Ignored,
    ];

    /// Label value used in the exported metric
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NeighborSolicitReceived => "neighbor_solicit_received",
            EventKind::UnicastTargetIsSelf => "unicast_target_is_self",
            EventKind::UnicastReachabilityRequest => "unicast_reachability_request",
            EventKind::MulticastJoinAssistantSolicit => "multicast_join_assistant_solicit",
            EventKind::MulticastSolicit => "multicast_solicit",
            EventKind::Ignored => "ignored",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Process-wide event tally.
#[derive(Clone)]
pub struct DiagnosticCounters {
    counters: [IntCounter; 6],
    registry: Registry,
}

impl DiagnosticCounters {
    /// Create a zeroed counter table with its own registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let events = IntCounterVec::new(
            Opts::new(
                "ndmgmt_ns_events_total",
                "Neighbor Solicitation events by classification outcome",
            ),
            &["event"],
        )?;
        registry.register(Box::new(events.clone()))?;

        // Resolve every child up front so increments skip the label lookup.
        let counters = EventKind::ALL.map(|kind| events.with_label_values(&[kind.as_str()]));

        Ok(Self { counters, registry })
    }

    /// Record one occurrence of `kind`
    #[inline]
    pub fn increment(&self, kind: EventKind) {
        self.counters[kind.index()].inc();
    }

    /// Current value for `kind`
    pub fn get(&self, kind: EventKind) -> u64 {
        self.counters[kind.index()].get()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            neighbor_solicit_received: self.get(EventKind::NeighborSolicitReceived),
            unicast_target_is_self: self.get(EventKind::UnicastTargetIsSelf),
            unicast_reachability_request: self.get(EventKind::UnicastReachabilityRequest),
            multicast_join_assistant_solicit: self.get(EventKind::MulticastJoinAssistantSolicit),
            multicast_solicit: self.get(EventKind::MulticastSolicit),
            ignored: self.get(EventKind::Ignored),
        }
    }

    /// Render the counters in the prometheus text exposition format
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Serializable copy of the counter table, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub neighbor_solicit_received: u64,
    pub unicast_target_is_self: u64,
    pub unicast_reachability_request: u64,
    pub multicast_join_assistant_solicit: u64,
    pub multicast_solicit: u64,
    pub ignored: u64,
}
