//! Capture surface and cursor types.
//!
//! On portal-based platforms the surface kind travels as an integer
//! bitmask; the values here match the ScreenCast portal's source types
//! so a backend can pass them through unchanged.

/// The kind of surface a capture grant covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSurface {
    /// An entire monitor. The only surface acceptable for an exam session.
    Monitor,
    /// A single application window.
    Window,
    /// A single browser tab (a virtual source on portal platforms).
    BrowserTab,
}

impl CaptureSurface {
    /// Convert to the portal's integer representation.
    pub fn to_portal_value(&self) -> u32 {
        match self {
            CaptureSurface::Monitor => 1,
            CaptureSurface::Window => 2,
            CaptureSurface::BrowserTab => 4,
        }
    }

    /// Human-readable label used in error messages and logs.
    pub fn label(&self) -> &'static str {
        match self {
            CaptureSurface::Monitor => "monitor",
            CaptureSurface::Window => "window",
            CaptureSurface::BrowserTab => "browser tab",
        }
    }
}

impl std::fmt::Display for CaptureSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Cursor visibility requested for the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    /// Cursor always embedded in the video (required for proctoring).
    Always,
    /// Cursor visible only while moving.
    Motion,
    /// Cursor hidden from the capture.
    Never,
}

impl CursorMode {
    /// The constraint keyword platforms understand.
    pub fn as_constraint(&self) -> &'static str {
        match self {
            CursorMode::Always => "always",
            CursorMode::Motion => "motion",
            CursorMode::Never => "never",
        }
    }
}

/// What the negotiator asks the platform for.
#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    /// Surface hint passed to the platform picker. Platforms may ignore
    /// the hint, which is why the granted surface is validated afterwards.
    pub surface: CaptureSurface,

    /// Requested cursor visibility.
    pub cursor: CursorMode,

    /// Whether to request audio alongside video.
    pub audio: bool,
}

impl CaptureConstraints {
    /// The fixed constraint set for exam sessions: full-monitor video
    /// with the cursor always visible, no audio.
    pub fn exam_defaults() -> Self {
        Self {
            surface: CaptureSurface::Monitor,
            cursor: CursorMode::Always,
            audio: false,
        }
    }
}
