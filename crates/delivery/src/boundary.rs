//! The outbound delivery boundary.

use async_trait::async_trait;
use invigil_common::error::InvigilResult;
use invigil_recorder::artifact::Artifact;
use invigil_session::metadata::SessionMetadata;

/// Why the recording ended, as reported to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The candidate finished and the stop was authorized.
    Manual,
    /// The platform ended screen sharing mid-exam.
    Interrupted,
}

impl EndReason {
    pub fn from_involuntary(involuntary: bool) -> Self {
        if involuntary {
            EndReason::Interrupted
        } else {
            EndReason::Manual
        }
    }

    /// Wire form of the reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::Manual => "manual",
            EndReason::Interrupted => "interrupted",
        }
    }
}

/// One finished recording plus everything the store needs to file it.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub metadata: SessionMetadata,
    pub end_reason: EndReason,
}

impl DeliveryRequest {
    pub fn new(artifact: Artifact, metadata: SessionMetadata, end_reason: EndReason) -> Self {
        Self {
            media_type: artifact.media_type().to_string(),
            bytes: artifact.into_bytes(),
            metadata,
            end_reason,
        }
    }

    pub fn payload_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// What the store reported back for a stored object.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReceipt {
    pub remote_id: Option<String>,
    pub remote_name: Option<String>,
    pub web_link: Option<String>,
}

/// One upload attempt per call.
///
/// Implementations never retry, chunk, or resume; a failed attempt is
/// reported as a delivery error and the artifact stays with the
/// caller, untouched.
#[async_trait]
pub trait DeliveryBoundary: Send + Sync {
    async fn deliver(&self, request: DeliveryRequest) -> InvigilResult<DeliveryReceipt>;

    /// Implementation name for logging.
    fn name(&self) -> &str;
}
