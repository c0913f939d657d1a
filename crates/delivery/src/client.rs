//! HTTP delivery to the exam object store.

use std::time::Duration;

use invigil_common::error::{InvigilError, InvigilResult};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::boundary::{DeliveryBoundary, DeliveryReceipt, DeliveryRequest};
use crate::naming;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Whole-request budget; recordings of a full exam part can run to
/// hundreds of megabytes on slow uplinks.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for the store's upload endpoint.
///
/// Constructed explicitly and handed to whoever needs it; nothing in
/// this crate holds a process-wide client.
pub struct HttpDeliveryClient {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpDeliveryClient {
    /// Build a client for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> InvigilResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| InvigilError::delivery(e.to_string()))?;
        Self::with_client(endpoint, http)
    }

    /// Build against a caller-supplied HTTP client, for callers that
    /// need their own proxy or TLS settings. Endpoint rules match
    /// [`Self::new`].
    pub fn with_client(endpoint: impl Into<String>, http: reqwest::Client) -> InvigilResult<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(InvigilError::invalid_input(
                "delivery endpoint must not be empty",
            ));
        }
        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreResponse {
    #[serde(default)]
    ok: bool,
    file_id: Option<String>,
    file_name: Option<String>,
    web_view_link: Option<String>,
    error: Option<String>,
}

/// Fold the store's reply into a receipt or a delivery error.
/// `body` carries the parse failure text when the response was not
/// the store's JSON shape.
fn interpret_reply(
    status: StatusCode,
    body: Result<StoreResponse, String>,
) -> InvigilResult<DeliveryReceipt> {
    let body = match body {
        Ok(body) => body,
        Err(parse_error) if status.is_success() => {
            return Err(InvigilError::delivery(format!(
                "unreadable store response: {parse_error}"
            )));
        }
        Err(_) => return Err(InvigilError::delivery(status.to_string())),
    };

    if !status.is_success() || !body.ok {
        let message = body.error.unwrap_or_else(|| status.to_string());
        tracing::warn!(status = %status, error = %message, "Store rejected the recording");
        return Err(InvigilError::delivery(message));
    }

    tracing::info!(
        remote_id = body.file_id.as_deref().unwrap_or("-"),
        remote_name = body.file_name.as_deref().unwrap_or("-"),
        "Recording delivered"
    );
    Ok(DeliveryReceipt {
        remote_id: body.file_id,
        remote_name: body.file_name,
        web_link: body.web_view_link,
    })
}

#[async_trait::async_trait]
impl DeliveryBoundary for HttpDeliveryClient {
    async fn deliver(&self, request: DeliveryRequest) -> InvigilResult<DeliveryReceipt> {
        let object_name = naming::object_name(request.metadata.part);
        tracing::info!(
            endpoint = %self.endpoint,
            object = %object_name,
            size_bytes = request.payload_len(),
            reason = request.end_reason.as_str(),
            "Delivering recording"
        );

        let file = Part::bytes(request.bytes)
            .file_name(object_name)
            .mime_str(&request.media_type)
            .map_err(|e| InvigilError::delivery(e.to_string()))?;
        let form = Form::new()
            .part("file", file)
            .text("studentId", request.metadata.student_id())
            .text("firstName", request.metadata.first_name)
            .text("lastName", request.metadata.last_name)
            .text("email", request.metadata.email)
            .text("part", request.metadata.part.display_name())
            .text("endReason", request.end_reason.as_str());

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| InvigilError::delivery(e.to_string()))?;

        let status = response.status();
        let body = response
            .json::<StoreResponse>()
            .await
            .map_err(|e| e.to_string());
        interpret_reply(status, body)
    }

    fn name(&self) -> &str {
        "http-store"
    }
}
