//! Session counters for telemetry and tests.

/// Counters collected by a [`LockstepSession`](crate::LockstepSession).
///
/// All counters are cumulative since the session was created, except
/// `last_step_us`, which describes the most recent frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionMetrics {
    /// Frames simulated forward, excluding replays.
    pub frames_advanced: u64,
    /// Frames re-simulated during rollback or resync.
    pub frames_replayed: u64,
    /// Commands applied successfully.
    pub commands_applied: u64,
    /// Commands rejected during application.
    pub commands_rejected: u64,
    /// Peer messages that were dropped as invalid, duplicate, or stale.
    pub messages_dropped: u64,
    /// Inbound pushes refused because the inbound buffer was full.
    pub inbound_overflows: u64,
    /// Messages left in the outbox after a flush because the addressed
    /// peer's queue was full, summed over flushes.
    pub outbound_deferred: u64,
    /// Checksum mismatches observed.
    pub desyncs_detected: u64,
    /// Local rollback-and-replay recoveries.
    pub rollbacks: u64,
    /// Snapshots requested from a peer.
    pub snapshots_requested: u64,
    /// Snapshots sent to peers.
    pub snapshots_sent: u64,
    /// Snapshot resyncs applied.
    pub resyncs: u64,
    /// Wall-clock time of the last frame step, in microseconds.
    pub last_step_us: u64,
}
