//! Live capture stream handles.

use tokio::sync::watch;

use crate::surface::CaptureSurface;

/// Teardown hook a backend installs to release the platform capture
/// (and its on-screen sharing indicator) when the tracks are stopped.
pub type TrackReleaser = Box<dyn FnOnce() + Send>;

/// A granted capture stream holding one live video track.
///
/// The stream owns the track for its whole life: stopping the tracks
/// releases the platform capture exactly once, and dropping a live
/// stream does the same. The `ended` signal fires when the platform
/// side terminates the track (the user revoking the share, the source
/// disappearing); a locally initiated `stop_tracks` does not fire it.
pub struct CaptureStream {
    surface: CaptureSurface,
    ended: watch::Receiver<bool>,
    releaser: Option<TrackReleaser>,
}

impl CaptureStream {
    /// Wrap a granted track. `ended` must start at `false` and flip to
    /// `true` when the platform ends the track; a dropped sender is
    /// treated as ended by subscribers.
    pub fn new(
        surface: CaptureSurface,
        ended: watch::Receiver<bool>,
        releaser: TrackReleaser,
    ) -> Self {
        Self {
            surface,
            ended,
            releaser: Some(releaser),
        }
    }

    /// The surface kind the platform actually granted.
    pub fn surface(&self) -> CaptureSurface {
        self.surface
    }

    /// Subscribe to the track-ended signal.
    pub fn ended_signal(&self) -> watch::Receiver<bool> {
        self.ended.clone()
    }

    /// Whether the track has already ended on the platform side.
    pub fn has_ended(&self) -> bool {
        *self.ended.borrow()
    }

    /// Whether the track is still held (tracks not yet stopped).
    pub fn is_live(&self) -> bool {
        self.releaser.is_some()
    }

    /// Stop all tracks, releasing the platform capture. Idempotent.
    pub fn stop_tracks(&mut self) {
        if let Some(release) = self.releaser.take() {
            tracing::debug!(surface = %self.surface, "Stopping capture tracks");
            release();
        }
    }
}

impl std::fmt::Debug for CaptureStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureStream")
            .field("surface", &self.surface)
            .field("live", &self.releaser.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        if self.releaser.is_some() {
            tracing::debug!("Releasing capture tracks on drop");
            self.stop_tracks();
        }
    }
}
