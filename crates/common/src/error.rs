//! Error types shared across Invigil crates.

/// Top-level error type for Invigil operations.
#[derive(Debug, thiserror::Error)]
pub enum InvigilError {
    /// The platform refused to grant screen capture.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// No capturable screen device was found.
    #[error("No capture device: {message}")]
    NoDevice { message: String },

    /// The user granted a non-monitor surface; the capture was discarded.
    #[error("Wrong capture surface: got {granted}, a full monitor is required")]
    WrongSurface { granted: String },

    /// Capture negotiation failed for a reason outside the known taxonomy.
    #[error("Capture error: {message}")]
    CaptureUnknown { message: String },

    /// Finalized recording was empty or too small to be a usable artifact.
    #[error("Recording too small to keep: {size_bytes} bytes")]
    ContentInsufficient { size_bytes: u64 },

    /// Encoder setup or operation failed.
    #[error("Encoder error: {message}")]
    Encoder { message: String },

    /// A session command was not valid in the current state.
    #[error("Session error: {message}")]
    Session { message: String },

    /// Handing the artifact to the storage boundary failed.
    #[error("Delivery failed: {message}")]
    Delivery { message: String },

    /// A required server-side setting is absent.
    #[error("Not configured: {message}")]
    NotConfigured { message: String },

    /// A submitted credential did not match the stored value.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Caller-supplied input failed validation.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Configuration file or value problem.
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using InvigilError.
pub type InvigilResult<T> = Result<T, InvigilError>;

impl InvigilError {
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }

    pub fn no_device(msg: impl Into<String>) -> Self {
        Self::NoDevice {
            message: msg.into(),
        }
    }

    pub fn wrong_surface(granted: impl Into<String>) -> Self {
        Self::WrongSurface {
            granted: granted.into(),
        }
    }

    pub fn capture_unknown(msg: impl Into<String>) -> Self {
        Self::CaptureUnknown {
            message: msg.into(),
        }
    }

    pub fn content_insufficient(size_bytes: u64) -> Self {
        Self::ContentInsufficient { size_bytes }
    }

    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery {
            message: msg.into(),
        }
    }

    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured {
            message: msg.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
