//! Invigil Capture
//!
//! Negotiates screen capture grants for exam sessions and validates the
//! surface the platform actually granted. Only a full monitor passes;
//! a window or browser-tab grant is torn down on the spot so no
//! sharing indicator outlives the rejection.
//!
//! The platform seam is [`backend::CaptureBackend`]; the in-tree
//! [`sim::SimCaptureBackend`] drives tests and headless runs.

pub mod backend;
pub mod negotiator;
pub mod sim;
pub mod stream;
pub mod surface;

pub use backend::CaptureBackend;
pub use negotiator::CaptureNegotiator;
pub use stream::CaptureStream;
pub use surface::{CaptureConstraints, CaptureSurface, CursorMode};
