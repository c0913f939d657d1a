//! Proctoring surface over the recording core.
//!
//! Admission checks the access code and logs the candidate, the flow
//! runs one session end to end, and the stores are the seams to the
//! deployment's settings service and session log.

pub mod admission;
pub mod flow;
pub mod stores;

pub use admission::{AdmissionDesk, AdmissionForm};
pub use flow::{ExamFlow, ExamReport};
pub use stores::{
    EnvSettingsStore, RosterEntry, RosterStore, SettingsStore, SimRoster, SimSettingsStore,
};
