//! Capture negotiation and post-grant surface validation.

use std::sync::Arc;

use invigil_common::error::{InvigilError, InvigilResult};

use crate::backend::CaptureBackend;
use crate::stream::CaptureStream;
use crate::surface::{CaptureConstraints, CaptureSurface};

/// Negotiates a screen capture grant suitable for an exam session.
///
/// Platforms cannot pre-filter the picker by surface kind, so the
/// negotiator requests a monitor and then validates what was granted.
/// A non-monitor grant is torn down (tracks stopped, sharing indicator
/// cleared) before the `WrongSurface` error is returned.
pub struct CaptureNegotiator {
    backend: Arc<dyn CaptureBackend>,
}

impl CaptureNegotiator {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self { backend }
    }

    /// Request full-monitor, video-only capture with the cursor visible.
    pub async fn request_monitor_capture(&self) -> InvigilResult<CaptureStream> {
        let constraints = CaptureConstraints::exam_defaults();

        if !self.backend.is_available() {
            return Err(InvigilError::no_device(format!(
                "capture backend '{}' is not available in this environment",
                self.backend.name()
            )));
        }

        tracing::info!(
            backend = %self.backend.name(),
            surface = %constraints.surface,
            cursor = constraints.cursor.as_constraint(),
            "Requesting screen capture"
        );

        let mut stream = match self.backend.request_capture(&constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "Capture grant failed");
                return Err(e);
            }
        };

        let granted = stream.surface();
        if granted != CaptureSurface::Monitor {
            tracing::warn!(granted = %granted, "Non-monitor surface granted, discarding capture");
            stream.stop_tracks();
            return Err(InvigilError::wrong_surface(granted.label()));
        }

        tracing::info!(granted = %granted, "Screen capture granted");
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimCaptureBackend;

    #[tokio::test]
    async fn monitor_grant_passes_validation() {
        let backend = Arc::new(SimCaptureBackend::granting(CaptureSurface::Monitor));
        let negotiator = CaptureNegotiator::new(backend.clone());

        let stream = negotiator.request_monitor_capture().await.unwrap();
        assert_eq!(stream.surface(), CaptureSurface::Monitor);
        assert!(stream.is_live());
        assert!(!backend.last_grant_released());
    }

    #[tokio::test]
    async fn window_grant_is_released_before_error() {
        let backend = Arc::new(SimCaptureBackend::granting(CaptureSurface::Window));
        let negotiator = CaptureNegotiator::new(backend.clone());

        let err = negotiator.request_monitor_capture().await.unwrap_err();
        assert!(matches!(err, InvigilError::WrongSurface { .. }));
        assert!(backend.last_grant_released());
    }

    #[tokio::test]
    async fn browser_tab_grant_is_rejected() {
        let backend = Arc::new(SimCaptureBackend::granting(CaptureSurface::BrowserTab));
        let negotiator = CaptureNegotiator::new(backend.clone());

        let err = negotiator.request_monitor_capture().await.unwrap_err();
        assert!(matches!(err, InvigilError::WrongSurface { granted } if granted == "browser tab"));
        assert!(backend.last_grant_released());
    }

    #[tokio::test]
    async fn denial_maps_to_permission_denied() {
        let backend = Arc::new(SimCaptureBackend::denying());
        let negotiator = CaptureNegotiator::new(backend);

        let err = negotiator.request_monitor_capture().await.unwrap_err();
        assert!(matches!(err, InvigilError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn missing_device_maps_to_no_device() {
        let backend = Arc::new(SimCaptureBackend::without_device());
        let negotiator = CaptureNegotiator::new(backend);

        let err = negotiator.request_monitor_capture().await.unwrap_err();
        assert!(matches!(err, InvigilError::NoDevice { .. }));
    }
}
