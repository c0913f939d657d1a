//! Session lifecycle for exam recordings.
//!
//! A session moves through a fixed forward-only state machine while a
//! guard task owns the live capture and recorder. The crate also
//! carries the exam metadata attached to every session and the
//! elapsed-time reporter driven by the guard's recording flag.

pub mod guard;
pub mod metadata;
pub mod reporter;
pub mod state;

pub use guard::{GuardHandle, SessionConfig, SessionGuard, SessionOutcome, SessionSnapshot};
pub use metadata::{ExamPart, QualitySetting, SessionMetadata};
pub use reporter::ElapsedReporter;
pub use state::{transition, SessionEvent, SessionStatus, TransitionDenied};
