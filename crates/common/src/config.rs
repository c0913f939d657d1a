//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the default video bitrate (bits/second).
pub const BITRATE_ENV: &str = "INVIGIL_VIDEO_BITRATE";

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default recording settings.
    pub recording: RecordingDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default recording parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingDefaults {
    /// Default video bitrate in bits per second. `None` (or a zero value)
    /// defers to the built-in fallback at recorder open time.
    pub video_bitrate_bps: Option<u32>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "invigil=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recording: RecordingDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RecordingDefaults {
    fn default() -> Self {
        Self {
            video_bitrate_bps: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    /// A `INVIGIL_VIDEO_BITRATE` environment value, when valid, overrides
    /// the file-provided bitrate.
    pub fn load() -> Self {
        Self::load_from(&config_file_path()).with_env_overrides()
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var(BITRATE_ENV) {
            match parse_bitrate_override(&raw) {
                Some(bps) => self.recording.video_bitrate_bps = Some(bps),
                None => {
                    tracing::warn!(value = %raw, "Ignoring invalid {} override", BITRATE_ENV);
                }
            }
        }
        self
    }
}

/// Parse an environment bitrate override. Only positive integers count;
/// anything else is ignored in favor of the configured/fallback value.
pub fn parse_bitrate_override(raw: &str) -> Option<u32> {
    match raw.trim().parse::<u32>() {
        Ok(bps) if bps > 0 => Some(bps),
        _ => None,
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("invigil").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn load_from_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.json"));
        assert_eq!(config.recording.video_bitrate_bps, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn load_from_reads_configured_bitrate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"recording":{{"video_bitrate_bps":1500000}},"logging":{{"level":"debug","json":false,"file":null}}}}"#
        )
        .unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.recording.video_bitrate_bps, Some(1_500_000));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn load_from_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.recording.video_bitrate_bps, None);
    }

    #[test]
    fn bitrate_override_rejects_junk() {
        assert_eq!(parse_bitrate_override("1250000"), Some(1_250_000));
        assert_eq!(parse_bitrate_override(" 2500000 "), Some(2_500_000));
        assert_eq!(parse_bitrate_override("0"), None);
        assert_eq!(parse_bitrate_override("-5"), None);
        assert_eq!(parse_bitrate_override("fast"), None);
        assert_eq!(parse_bitrate_override(""), None);
    }
}
