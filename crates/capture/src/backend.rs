//! Abstract interface for platform screen capture.

use invigil_common::error::InvigilResult;

use crate::stream::CaptureStream;
use crate::surface::CaptureConstraints;

/// Platform-specific capture capability.
///
/// Implementations surface their failures through the shared error
/// taxonomy: a refused grant maps to `PermissionDenied`, an absent
/// capture source to `NoDevice`, and anything else to `CaptureUnknown`.
/// Surface validation is not the backend's job; the negotiator checks
/// what was actually granted.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Ask the platform for a capture grant under the given constraints.
    ///
    /// A successful grant hands back a live stream whose surface kind
    /// reflects what the user actually picked, which may differ from
    /// the constraint hint.
    async fn request_capture(
        &self,
        constraints: &CaptureConstraints,
    ) -> InvigilResult<CaptureStream>;

    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Whether this backend can run in the current environment
    /// (e.g. the ScreenCast portal is reachable).
    fn is_available(&self) -> bool {
        true
    }
}
