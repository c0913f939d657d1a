//! Session lifecycle state machine.
//!
//! Transitions are forward-only: once a session starts it can only
//! move toward a terminal state, and `Reset` is the single edge back
//! to idle. The table is total; anything it does not name is denied.

/// Lifecycle states of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No session resources held. Re-enterable only via reset.
    Idle,
    /// Capture negotiation and recorder setup in progress.
    Starting,
    /// Chunks are being collected.
    Recording,
    /// Stop sequence running: flush, stop, drain, finalize.
    Stopping,
    /// Finalized with a viable artifact.
    Finished,
    /// Ended without a usable artifact.
    Errored,
}

impl SessionStatus {
    /// Whether the session has reached an end state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Finished | SessionStatus::Errored)
    }

    /// Whether session resources (stream, recorder) may be held.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionStatus::Starting | SessionStatus::Recording | SessionStatus::Stopping
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Starting => "starting",
            SessionStatus::Recording => "recording",
            SessionStatus::Stopping => "stopping",
            SessionStatus::Finished => "finished",
            SessionStatus::Errored => "errored",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Events that drive the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Caller asked to start.
    StartRequested,
    /// Negotiation and recorder setup succeeded.
    CaptureReady,
    /// Negotiation or recorder setup failed.
    CaptureFailed,
    /// Caller asked to stop.
    StopRequested,
    /// The platform ended the track out from under us.
    TrackEnded,
    /// Finalization produced a viable artifact.
    FinalizeSucceeded,
    /// Finalization failed (usually: not enough content).
    FinalizeFailed,
    /// Caller asked to return a terminal session to idle.
    Reset,
}

/// A transition the table does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionDenied {
    pub from: SessionStatus,
    pub event: SessionEvent,
}

impl std::fmt::Display for TransitionDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} is not allowed in state {}", self.event, self.from)
    }
}

/// The transition table.
pub fn transition(
    from: SessionStatus,
    event: SessionEvent,
) -> Result<SessionStatus, TransitionDenied> {
    use SessionEvent::*;
    use SessionStatus::*;

    match (from, event) {
        (Idle, StartRequested) => Ok(Starting),
        (Starting, CaptureReady) => Ok(Recording),
        (Starting, CaptureFailed) => Ok(Errored),
        (Recording, StopRequested) => Ok(Stopping),
        (Recording, TrackEnded) => Ok(Stopping),
        (Stopping, FinalizeSucceeded) => Ok(Finished),
        (Stopping, FinalizeFailed) => Ok(Errored),
        (Finished, Reset) | (Errored, Reset) => Ok(Idle),
        _ => Err(TransitionDenied { from, event }),
    }
}
