//! Recorder engine: chunk accumulation and the stop sequence.

use std::time::Duration;

use invigil_common::error::InvigilResult;
use tokio::sync::mpsc;

use crate::artifact::Artifact;
use crate::bitrate::resolve_bitrate;
use crate::encoder::{ChunkEncoder, EncoderEvent, EncoderFactory};
use crate::profile::{negotiate_profile, EncoderProfile};

/// Fixed chunk cadence requested from the encoder.
pub const CHUNK_INTERVAL: Duration = Duration::from_secs(1);

/// How long the stop sequence waits for the encoder's acknowledgment
/// before finalizing with whatever has arrived.
const STOP_DRAIN_DEADLINE: Duration = Duration::from_secs(5);

/// Opens recorder handles over the encoder seam.
pub struct RecorderEngine;

impl RecorderEngine {
    /// Negotiate a profile, resolve the bitrate, and start encoding.
    ///
    /// Bitrate precedence is caller override, then the configured
    /// default, then the built-in fallback; zero values are invalid at
    /// every level.
    pub async fn open(
        factory: &dyn EncoderFactory,
        override_bitrate: Option<u32>,
        configured_bitrate: Option<u32>,
    ) -> InvigilResult<RecorderHandle> {
        let profile = negotiate_profile(factory)?;
        let bitrate_bps = resolve_bitrate(override_bitrate, configured_bitrate);

        let mut encoder = factory.open(&profile, bitrate_bps)?;
        let events = encoder.start(CHUNK_INTERVAL).await?;

        tracing::info!(
            profile = profile.mime(),
            bitrate_bps,
            "Recorder opened"
        );

        Ok(RecorderHandle {
            encoder,
            events,
            chunks: Vec::new(),
            total_bytes: 0,
            profile,
            bitrate_bps,
        })
    }
}

/// A live recording: accumulates chunks in arrival order and owns the
/// stop sequence that turns them into an artifact.
pub struct RecorderHandle {
    encoder: Box<dyn ChunkEncoder>,
    events: mpsc::Receiver<EncoderEvent>,
    chunks: Vec<Vec<u8>>,
    total_bytes: u64,
    profile: EncoderProfile,
    bitrate_bps: u32,
}

impl RecorderHandle {
    /// The bitrate the encoder was opened with.
    pub fn bitrate_bps(&self) -> u32 {
        self.bitrate_bps
    }

    /// The negotiated encoder profile.
    pub fn profile(&self) -> &EncoderProfile {
        &self.profile
    }

    /// Chunks accumulated so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Bytes accumulated so far.
    pub fn buffered_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Wait for the next encoder event. `None` means the encoder's
    /// event channel closed.
    pub async fn next_event(&mut self) -> Option<EncoderEvent> {
        self.events.recv().await
    }

    /// Fold one encoder event into the accumulated state.
    pub fn absorb(&mut self, event: EncoderEvent) {
        match event {
            EncoderEvent::Chunk(data) => self.absorb_chunk(data),
            EncoderEvent::Stopped => {
                tracing::debug!("Stop acknowledgment outside the stop sequence");
            }
        }
    }

    fn absorb_chunk(&mut self, data: Vec<u8>) {
        if data.is_empty() {
            tracing::debug!("Dropping zero-length chunk");
            return;
        }
        self.total_bytes += data.len() as u64;
        tracing::debug!(
            size = data.len(),
            total = self.total_bytes,
            "Chunk collected"
        );
        self.chunks.push(data);
    }

    /// Run the stop sequence and finalize the artifact.
    ///
    /// Order matters: flush buffered data, stop the encoder, then
    /// drain events until the stop acknowledgment so the final chunk
    /// lands before concatenation. The drain is bounded; on timeout
    /// finalization proceeds with whatever arrived.
    pub async fn finish(mut self) -> InvigilResult<Artifact> {
        if self.encoder.is_running() {
            self.encoder.request_data()?;
            self.encoder.stop()?;
        }

        let deadline = tokio::time::Instant::now() + STOP_DRAIN_DEADLINE;
        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(EncoderEvent::Chunk(data))) => self.absorb_chunk(data),
                Ok(Some(EncoderEvent::Stopped)) => {
                    tracing::debug!("Stop acknowledged; encoder drained");
                    break;
                }
                Ok(None) => {
                    tracing::warn!("Encoder event channel closed before stop acknowledgment");
                    break;
                }
                Err(_) => {
                    tracing::warn!(
                        deadline_secs = STOP_DRAIN_DEADLINE.as_secs(),
                        "Stop drain timed out; finalizing with collected chunks"
                    );
                    break;
                }
            }
        }

        let chunk_count = self.chunks.len();
        match Artifact::from_chunks(self.chunks, self.profile.container()) {
            Ok(artifact) => {
                tracing::info!(
                    size_bytes = artifact.size_bytes(),
                    chunks = chunk_count,
                    media_type = artifact.media_type(),
                    "Recording finalized"
                );
                Ok(artifact)
            }
            Err(e) => {
                tracing::warn!(chunks = chunk_count, error = %e, "Recording not viable");
                Err(e)
            }
        }
    }

    /// Best-effort stop without finalization, for teardown paths.
    pub fn abort(mut self) {
        if self.encoder.is_running() {
            if let Err(e) = self.encoder.stop() {
                tracing::debug!(error = %e, "Encoder stop failed during abort");
            }
        }
        tracing::debug!(
            chunks = self.chunks.len(),
            "Recorder aborted without finalization"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimEncoderFactory;
    use invigil_common::error::InvigilError;

    #[tokio::test]
    async fn collects_chunks_in_arrival_order() {
        let factory = SimEncoderFactory::new();
        let mut recorder = RecorderEngine::open(&factory, None, None).await.unwrap();
        let handle = factory.last_handle().unwrap();

        handle.emit_now(vec![1u8; 400]);
        handle.emit_now(vec![2u8; 600]);
        handle.emit_now(vec![3u8; 500]);

        for _ in 0..3 {
            let event = recorder.next_event().await.unwrap();
            recorder.absorb(event);
        }
        assert_eq!(recorder.chunk_count(), 3);
        assert_eq!(recorder.buffered_bytes(), 1500);

        let artifact = recorder.finish().await.unwrap();
        assert_eq!(artifact.size_bytes(), 1500);
        assert_eq!(&artifact.as_bytes()[..400], &[1u8; 400][..]);
        assert_eq!(&artifact.as_bytes()[400..1000], &[2u8; 600][..]);
        assert_eq!(&artifact.as_bytes()[1000..], &[3u8; 500][..]);
    }

    #[tokio::test]
    async fn zero_length_chunks_are_dropped() {
        let factory = SimEncoderFactory::new();
        let mut recorder = RecorderEngine::open(&factory, None, None).await.unwrap();
        let handle = factory.last_handle().unwrap();

        handle.emit_now(vec![7u8; 150]);
        handle.emit_now(Vec::new());

        for _ in 0..2 {
            let event = recorder.next_event().await.unwrap();
            recorder.absorb(event);
        }
        assert_eq!(recorder.chunk_count(), 1);

        let artifact = recorder.finish().await.unwrap();
        assert_eq!(artifact.size_bytes(), 150);
        assert_eq!(artifact.chunk_count(), 1);
    }

    #[tokio::test]
    async fn flush_lands_buffered_bytes_in_the_artifact() {
        let factory = SimEncoderFactory::new();
        let recorder = RecorderEngine::open(&factory, None, None).await.unwrap();
        let handle = factory.last_handle().unwrap();

        // Buffered but never emitted on the cadence; only the flush in
        // the stop sequence can save it.
        handle.buffer(&[9u8; 240]);

        let artifact = recorder.finish().await.unwrap();
        assert_eq!(artifact.size_bytes(), 240);
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn no_data_finalizes_as_content_insufficient() {
        let factory = SimEncoderFactory::new();
        let recorder = RecorderEngine::open(&factory, None, None).await.unwrap();

        let err = recorder.finish().await.unwrap_err();
        assert!(matches!(
            err,
            InvigilError::ContentInsufficient { size_bytes: 0 }
        ));
    }

    #[tokio::test]
    async fn tiny_recording_finalizes_as_content_insufficient() {
        let factory = SimEncoderFactory::new();
        let mut recorder = RecorderEngine::open(&factory, None, None).await.unwrap();
        let handle = factory.last_handle().unwrap();

        handle.emit_now(vec![0u8; 60]);
        let event = recorder.next_event().await.unwrap();
        recorder.absorb(event);

        let err = recorder.finish().await.unwrap_err();
        assert!(matches!(
            err,
            InvigilError::ContentInsufficient { size_bytes: 60 }
        ));
    }

    #[tokio::test]
    async fn open_reports_resolved_bitrate_to_the_encoder() {
        let factory = SimEncoderFactory::new();
        let recorder = RecorderEngine::open(&factory, Some(1_250_000), Some(1_500_000))
            .await
            .unwrap();

        assert_eq!(recorder.bitrate_bps(), 1_250_000);
        let (mime, bitrate) = factory.last_open().unwrap();
        assert_eq!(mime, "video/webm;codecs=vp9");
        assert_eq!(bitrate, 1_250_000);
        recorder.abort();
    }

    #[tokio::test]
    async fn abort_stops_the_encoder_without_finalizing() {
        let factory = SimEncoderFactory::new();
        let recorder = RecorderEngine::open(&factory, None, None).await.unwrap();
        let handle = factory.last_handle().unwrap();

        assert!(handle.is_running());
        recorder.abort();
        assert!(!handle.is_running());
    }
}
