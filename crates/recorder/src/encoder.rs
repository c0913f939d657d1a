//! Chunk encoder seam.
//!
//! A chunk encoder turns a live capture into a stream of container
//! chunks on a fixed cadence, the way platform media recorders do.
//! The recorder engine never touches a concrete encoder directly; it
//! speaks this trait so tests and headless runs can substitute the
//! simulated encoder.

use std::time::Duration;

use invigil_common::error::InvigilResult;
use tokio::sync::mpsc;

use crate::profile::EncoderProfile;

/// Events an encoder emits while running.
#[derive(Debug)]
pub enum EncoderEvent {
    /// One encoded chunk. Zero-length chunks are legal at this layer;
    /// the engine drops them on arrival.
    Chunk(Vec<u8>),

    /// Acknowledgment that the encoder has stopped and emitted its
    /// final chunk. Nothing arrives after this.
    Stopped,
}

/// A running chunk encoder bound to one capture.
#[async_trait::async_trait]
pub trait ChunkEncoder: Send {
    /// Start encoding, emitting a chunk roughly every `timeslice`.
    /// Returns the event channel the engine consumes.
    async fn start(&mut self, timeslice: Duration) -> InvigilResult<mpsc::Receiver<EncoderEvent>>;

    /// Force emission of everything buffered since the last chunk.
    /// Only valid while running.
    fn request_data(&mut self) -> InvigilResult<()>;

    /// Stop encoding. The final chunk (if any) and the `Stopped`
    /// acknowledgment arrive on the event channel afterwards.
    fn stop(&mut self) -> InvigilResult<()>;

    /// Whether the encoder is currently running.
    fn is_running(&self) -> bool;
}

/// Opens encoders for negotiated profiles.
pub trait EncoderFactory: Send + Sync {
    /// Whether this factory can encode the given profile string.
    fn supports(&self, mime: &str) -> bool;

    /// Open an encoder for a supported profile at the given bitrate.
    fn open(
        &self,
        profile: &EncoderProfile,
        bitrate_bps: u32,
    ) -> InvigilResult<Box<dyn ChunkEncoder>>;
}
