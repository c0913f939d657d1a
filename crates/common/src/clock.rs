//! Clock utilities for recording sessions.
//!
//! A session is anchored to a monotonic epoch captured the moment
//! recording starts. Elapsed time shown to the candidate is derived
//! from that epoch, never from wall-clock arithmetic, so host clock
//! adjustments cannot skew the counter.

use std::time::{Duration, Instant};

/// A session clock anchored to the moment recording started.
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant recording started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new session clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Time elapsed since the session started.
    pub fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Whole seconds elapsed since the session started.
    pub fn elapsed_secs(&self) -> u64 {
        self.epoch.elapsed().as_secs()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// The underlying epoch instant.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

/// Render a second count as zero-padded `HH:MM:SS`.
///
/// Hours widen past two digits rather than wrap, so a marathon session
/// reads "100:00:00" instead of rolling over.
pub fn format_hms(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
