//! In-memory delivery store for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use invigil_common::error::{InvigilError, InvigilResult};

use crate::boundary::{DeliveryBoundary, DeliveryReceipt, DeliveryRequest};
use crate::naming;

/// One accepted upload, as the store saw it.
#[derive(Debug, Clone)]
pub struct StoredRecording {
    pub folder: String,
    pub object_name: String,
    pub size_bytes: u64,
    pub student_id: String,
    pub part: String,
    pub end_reason: String,
}

/// Delivery boundary that files recordings in memory.
#[derive(Default)]
pub struct SimDeliveryStore {
    stored: Mutex<Vec<StoredRecording>>,
    fail_next: Mutex<Option<String>>,
}

impl SimDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next delivery attempt fail with the given message.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.fail_next.lock().unwrap() = Some(message.into());
    }

    pub fn delivery_count(&self) -> usize {
        self.stored.lock().unwrap().len()
    }

    pub fn stored(&self) -> Vec<StoredRecording> {
        self.stored.lock().unwrap().clone()
    }

    pub fn last_stored(&self) -> Option<StoredRecording> {
        self.stored.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl DeliveryBoundary for SimDeliveryStore {
    async fn deliver(&self, request: DeliveryRequest) -> InvigilResult<DeliveryReceipt> {
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(InvigilError::delivery(message));
        }

        let record = StoredRecording {
            folder: naming::student_folder(&request.metadata),
            object_name: naming::object_name(request.metadata.part),
            size_bytes: request.payload_len(),
            student_id: request.metadata.student_id(),
            part: request.metadata.part.display_name().to_string(),
            end_reason: request.end_reason.as_str().to_string(),
        };
        let receipt = DeliveryReceipt {
            remote_id: Some(format!("sim-{}", self.delivery_count() + 1)),
            remote_name: Some(record.object_name.clone()),
            web_link: None,
        };
        self.stored.lock().unwrap().push(record);
        Ok(receipt)
    }

    fn name(&self) -> &str {
        "sim-store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::EndReason;
    use invigil_recorder::artifact::Artifact;
    use invigil_session::metadata::{ExamPart, SessionMetadata};

    fn request(part: ExamPart) -> DeliveryRequest {
        let artifact = Artifact::from_chunks(vec![vec![0u8; 300]], "video/webm").unwrap();
        DeliveryRequest::new(
            artifact,
            SessionMetadata {
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                email: "grace@example.com".into(),
                part,
            },
            EndReason::Manual,
        )
    }

    #[tokio::test]
    async fn stores_accepted_uploads_with_computed_names() {
        let store = SimDeliveryStore::new();
        let receipt = store.deliver(request(ExamPart::Part2)).await.unwrap();

        assert_eq!(receipt.remote_id.as_deref(), Some("sim-1"));
        let stored = store.last_stored().unwrap();
        assert_eq!(stored.folder, "grace_hopper");
        assert!(stored.object_name.starts_with("part2_"));
        assert!(stored.object_name.ends_with(".webm"));
        assert_eq!(stored.size_bytes, 300);
        assert_eq!(stored.student_id, "grace@example.com");
        assert_eq!(stored.end_reason, "manual");
    }

    #[tokio::test]
    async fn a_queued_failure_consumes_itself() {
        let store = SimDeliveryStore::new();
        store.fail_next("store offline");

        let err = store.deliver(request(ExamPart::Part1)).await.unwrap_err();
        assert!(matches!(err, InvigilError::Delivery { .. }));
        assert_eq!(store.delivery_count(), 0);

        store.deliver(request(ExamPart::Part1)).await.unwrap();
        assert_eq!(store.delivery_count(), 1);
    }
}
