//! End-to-end exam flow: one candidate from start through delivery.

use std::sync::Arc;

use invigil_capture::backend::CaptureBackend;
use invigil_common::error::{InvigilError, InvigilResult};
use invigil_delivery::boundary::{DeliveryBoundary, DeliveryRequest, EndReason};
use invigil_recorder::encoder::EncoderFactory;
use invigil_session::guard::{GuardHandle, SessionConfig, SessionGuard};
use invigil_session::metadata::SessionMetadata;
use invigil_session::state::SessionStatus;

/// Where one exam session ended up.
#[derive(Debug)]
pub struct ExamReport {
    pub status: SessionStatus,
    pub involuntary: bool,
    pub delivered: bool,
    pub remote_name: Option<String>,
    /// Message of the session failure, if the session itself failed.
    pub error: Option<String>,
    /// Message of the upload failure, if delivery was attempted and
    /// refused. Never invalidates the finished session.
    pub delivery_error: Option<String>,
}

/// Drives one candidate's session and performs the single delivery.
///
/// The flow holds the only guard handle and is the only caller of
/// `take_outcome`, so an artifact cannot be delivered twice.
pub struct ExamFlow {
    guard: GuardHandle,
    delivery: Arc<dyn DeliveryBoundary>,
    metadata: SessionMetadata,
}

impl ExamFlow {
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        encoders: Arc<dyn EncoderFactory>,
        delivery: Arc<dyn DeliveryBoundary>,
        metadata: SessionMetadata,
        config: SessionConfig,
    ) -> Self {
        let guard = SessionGuard::spawn(backend, encoders, config);
        Self {
            guard,
            delivery,
            metadata,
        }
    }

    /// The guard handle, for wiring reporters and status displays.
    pub fn guard(&self) -> &GuardHandle {
        &self.guard
    }

    /// Begin recording. Capture and encoder failures land in the
    /// session state rather than this result.
    pub async fn begin(&self) -> InvigilResult<()> {
        self.guard.start().await
    }

    /// Authorized explicit stop, then conclusion.
    pub async fn finish(&self) -> InvigilResult<ExamReport> {
        self.guard.stop().await?;
        self.conclude().await
    }

    /// Wait for the session to reach a terminal state, then deliver
    /// whatever is deliverable and report. Used directly when the
    /// session ends on its own (involuntary stop, failed start).
    pub async fn conclude(&self) -> InvigilResult<ExamReport> {
        let snapshot = self.guard.wait_terminal().await;
        let outcome = match self.guard.take_outcome().await {
            Some(outcome) => outcome,
            None => return Err(InvigilError::session("session outcome already taken")),
        };

        let mut report = ExamReport {
            status: snapshot.status,
            involuntary: outcome.involuntary,
            delivered: false,
            remote_name: None,
            error: outcome.error.as_ref().map(|e| e.to_string()),
            delivery_error: None,
        };

        let artifact = match outcome.artifact {
            Some(artifact) => artifact,
            None => {
                tracing::info!(status = %report.status, "Session ended with nothing to deliver");
                return Ok(report);
            }
        };

        let request = DeliveryRequest::new(
            artifact,
            self.metadata.clone(),
            EndReason::from_involuntary(outcome.involuntary),
        );
        match self.delivery.deliver(request).await {
            Ok(receipt) => {
                report.delivered = true;
                report.remote_name = receipt.remote_name;
            }
            Err(e) => {
                // The exam is over either way; the candidate moves on
                // and the failure goes to the proctors.
                tracing::warn!(error = %e, "Delivery failed");
                report.delivery_error = Some(e.to_string());
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invigil_capture::sim::SimCaptureBackend;
    use invigil_capture::surface::CaptureSurface;
    use invigil_delivery::sim::SimDeliveryStore;
    use invigil_recorder::sim::SimEncoderFactory;
    use invigil_session::metadata::ExamPart;

    fn metadata() -> SessionMetadata {
        SessionMetadata {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            part: ExamPart::Part1,
        }
    }

    fn flow_with(
        backend: SimCaptureBackend,
    ) -> (ExamFlow, Arc<SimEncoderFactory>, Arc<SimDeliveryStore>) {
        let encoders = Arc::new(SimEncoderFactory::new());
        let store = Arc::new(SimDeliveryStore::new());
        let flow = ExamFlow::new(
            Arc::new(backend),
            encoders.clone(),
            store.clone(),
            metadata(),
            SessionConfig::default(),
        );
        (flow, encoders, store)
    }

    #[tokio::test]
    async fn delivery_failure_does_not_unfinish_the_session() {
        let (flow, encoders, store) =
            flow_with(SimCaptureBackend::granting(CaptureSurface::Monitor));
        store.fail_next("store offline");

        flow.begin().await.unwrap();
        encoders.last_handle().unwrap().emit_now(vec![1u8; 500]);

        let report = flow.finish().await.unwrap();
        assert_eq!(report.status, SessionStatus::Finished);
        assert!(!report.delivered);
        assert_eq!(report.delivery_error.as_deref(), Some("Delivery failed: store offline"));
        assert!(report.error.is_none());
        assert_eq!(store.delivery_count(), 0);
    }

    #[tokio::test]
    async fn a_concluded_session_cannot_be_concluded_again() {
        let (flow, encoders, _store) =
            flow_with(SimCaptureBackend::granting(CaptureSurface::Monitor));

        flow.begin().await.unwrap();
        encoders.last_handle().unwrap().emit_now(vec![1u8; 500]);
        flow.finish().await.unwrap();

        let err = flow.conclude().await.unwrap_err();
        assert!(matches!(err, InvigilError::Session { .. }));
    }
}
