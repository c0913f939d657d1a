//! Simulated capture backend for tests and headless runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use invigil_common::error::{InvigilError, InvigilResult};
use tokio::sync::watch;

use crate::backend::CaptureBackend;
use crate::stream::CaptureStream;
use crate::surface::{CaptureConstraints, CaptureSurface};

/// What the next simulated grant request should produce.
#[derive(Debug, Clone)]
pub enum GrantOutcome {
    /// Grant a stream whose video track reports the given surface.
    Granted(CaptureSurface),
    /// The user refused the picker.
    Denied,
    /// No capturable screen exists.
    NoDevice,
    /// Some other platform failure.
    Failure(String),
}

/// Scriptable in-process capture backend.
///
/// Each `request_capture` consumes the next queued outcome, falling
/// back to the default outcome when the queue is empty. Granted
/// streams expose two observation points for tests: whether their
/// tracks were stopped (`last_grant_released`) and a revocation
/// trigger (`revoke`) that fires the track-ended signal the way a
/// user clicking the platform's stop-sharing button would.
pub struct SimCaptureBackend {
    default_outcome: GrantOutcome,
    queued: Mutex<VecDeque<GrantOutcome>>,
    last_released: Mutex<Option<Arc<AtomicBool>>>,
    ended_tx: Mutex<Option<watch::Sender<bool>>>,
    grants: AtomicUsize,
}

impl SimCaptureBackend {
    /// A backend that grants streams reporting the given surface.
    pub fn granting(surface: CaptureSurface) -> Self {
        Self::with_default(GrantOutcome::Granted(surface))
    }

    /// A backend that refuses every request.
    pub fn denying() -> Self {
        Self::with_default(GrantOutcome::Denied)
    }

    /// A backend with no capturable screen.
    pub fn without_device() -> Self {
        Self::with_default(GrantOutcome::NoDevice)
    }

    /// A backend that fails with an unclassified platform error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_default(GrantOutcome::Failure(message.into()))
    }

    fn with_default(default_outcome: GrantOutcome) -> Self {
        Self {
            default_outcome,
            queued: Mutex::new(VecDeque::new()),
            last_released: Mutex::new(None),
            ended_tx: Mutex::new(None),
            grants: AtomicUsize::new(0),
        }
    }

    /// Queue an outcome for a future request ahead of the default.
    pub fn push_outcome(&self, outcome: GrantOutcome) {
        self.queued.lock().unwrap().push_back(outcome);
    }

    /// Number of grants handed out so far.
    pub fn grant_count(&self) -> usize {
        self.grants.load(Ordering::SeqCst)
    }

    /// Whether the most recently granted stream had its tracks stopped.
    pub fn last_grant_released(&self) -> bool {
        self.last_released
            .lock()
            .unwrap()
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// End the most recently granted track, as if the user revoked the
    /// share from the platform's own UI.
    pub fn revoke(&self) {
        if let Some(tx) = self.ended_tx.lock().unwrap().as_ref() {
            tx.send(true).ok();
        }
    }

    fn next_outcome(&self) -> GrantOutcome {
        self.queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.clone())
    }
}

#[async_trait::async_trait]
impl CaptureBackend for SimCaptureBackend {
    async fn request_capture(
        &self,
        _constraints: &CaptureConstraints,
    ) -> InvigilResult<CaptureStream> {
        match self.next_outcome() {
            GrantOutcome::Granted(surface) => {
                let (ended_tx, ended_rx) = watch::channel(false);
                let released = Arc::new(AtomicBool::new(false));

                *self.last_released.lock().unwrap() = Some(released.clone());
                *self.ended_tx.lock().unwrap() = Some(ended_tx);
                self.grants.fetch_add(1, Ordering::SeqCst);

                let stream = CaptureStream::new(
                    surface,
                    ended_rx,
                    Box::new(move || {
                        released.store(true, Ordering::SeqCst);
                    }),
                );
                Ok(stream)
            }
            GrantOutcome::Denied => Err(InvigilError::permission_denied(
                "screen share permission was denied",
            )),
            GrantOutcome::NoDevice => {
                Err(InvigilError::no_device("no screen share device found"))
            }
            GrantOutcome::Failure(message) => Err(InvigilError::capture_unknown(message)),
        }
    }

    fn name(&self) -> &str {
        "sim"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_outcomes_run_before_the_default() {
        let backend = SimCaptureBackend::granting(CaptureSurface::Monitor);
        backend.push_outcome(GrantOutcome::Denied);

        let constraints = CaptureConstraints::exam_defaults();
        let first = backend.request_capture(&constraints).await;
        assert!(matches!(
            first,
            Err(InvigilError::PermissionDenied { .. })
        ));

        let second = backend.request_capture(&constraints).await.unwrap();
        assert_eq!(second.surface(), CaptureSurface::Monitor);
        assert_eq!(backend.grant_count(), 1);
    }

    #[tokio::test]
    async fn revoke_fires_the_ended_signal() {
        let backend = SimCaptureBackend::granting(CaptureSurface::Monitor);
        let constraints = CaptureConstraints::exam_defaults();
        let stream = backend.request_capture(&constraints).await.unwrap();

        assert!(!stream.has_ended());
        backend.revoke();
        assert!(stream.has_ended());
    }

    #[tokio::test]
    async fn release_is_observable() {
        let backend = SimCaptureBackend::granting(CaptureSurface::Monitor);
        let constraints = CaptureConstraints::exam_defaults();
        let mut stream = backend.request_capture(&constraints).await.unwrap();

        assert!(!backend.last_grant_released());
        stream.stop_tracks();
        assert!(backend.last_grant_released());
    }
}
