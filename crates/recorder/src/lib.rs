//! Invigil Recorder
//!
//! Turns a granted capture into a finalized artifact. The engine asks
//! the encoder seam for chunks on a fixed one-second cadence, keeps
//! every nonzero chunk in arrival order, and runs an ordered stop
//! sequence (flush, stop, drain to the acknowledgment) so the tail of
//! the recording is never lost. Finalization enforces the viability
//! threshold: a too-small artifact is reported, not delivered.

pub mod artifact;
pub mod bitrate;
pub mod encoder;
pub mod engine;
pub mod profile;
pub mod sim;

pub use artifact::{Artifact, MIN_VIABLE_ARTIFACT_BYTES};
pub use bitrate::{resolve_bitrate, DEFAULT_VIDEO_BITRATE};
pub use encoder::{ChunkEncoder, EncoderEvent, EncoderFactory};
pub use engine::{RecorderEngine, RecorderHandle, CHUNK_INTERVAL};
pub use profile::{negotiate_profile, EncoderProfile, PROFILE_FALLBACK_ORDER};
pub use sim::{SimEncoder, SimEncoderFactory, SimEncoderHandle};
