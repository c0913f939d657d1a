//! Encoder profile negotiation.

use invigil_common::error::{InvigilError, InvigilResult};

use crate::encoder::EncoderFactory;

/// Profile candidates in preference order. VP9 gives the best quality
/// per bit; the bare container lets the platform pick its default
/// codec; VP8 is the compatibility floor.
pub const PROFILE_FALLBACK_ORDER: [&str; 3] = [
    "video/webm;codecs=vp9",
    "video/webm",
    "video/webm;codecs=vp8",
];

/// A negotiated encoder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderProfile {
    mime: String,
}

impl EncoderProfile {
    pub fn new(mime: impl Into<String>) -> Self {
        Self { mime: mime.into() }
    }

    /// Full profile string, codec parameters included.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Container media type without codec parameters, used to tag the
    /// finalized artifact.
    pub fn container(&self) -> &str {
        self.mime
            .split(';')
            .next()
            .map(str::trim)
            .unwrap_or(&self.mime)
    }
}

/// Pick the first profile the encoder factory supports.
///
/// An unsupported configuration is never handed to the encoder; when
/// nothing in the fallback order is supported the recorder cannot open.
pub fn negotiate_profile(factory: &dyn EncoderFactory) -> InvigilResult<EncoderProfile> {
    for candidate in PROFILE_FALLBACK_ORDER {
        if factory.supports(candidate) {
            tracing::debug!(profile = candidate, "Encoder profile negotiated");
            return Ok(EncoderProfile::new(candidate));
        }
        tracing::debug!(profile = candidate, "Encoder profile unsupported, trying next");
    }
    Err(InvigilError::encoder(
        "no supported encoder profile in the video/webm family",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimEncoderFactory;

    #[test]
    fn prefers_vp9_when_everything_is_supported() {
        let factory = SimEncoderFactory::new();
        let profile = negotiate_profile(&factory).unwrap();
        assert_eq!(profile.mime(), "video/webm;codecs=vp9");
        assert_eq!(profile.container(), "video/webm");
    }

    #[test]
    fn falls_back_to_bare_container() {
        let factory = SimEncoderFactory::supporting(["video/webm", "video/webm;codecs=vp8"]);
        let profile = negotiate_profile(&factory).unwrap();
        assert_eq!(profile.mime(), "video/webm");
    }

    #[test]
    fn falls_back_to_vp8_last() {
        let factory = SimEncoderFactory::supporting(["video/webm;codecs=vp8"]);
        let profile = negotiate_profile(&factory).unwrap();
        assert_eq!(profile.mime(), "video/webm;codecs=vp8");
        assert_eq!(profile.container(), "video/webm");
    }

    #[test]
    fn errors_when_nothing_is_supported() {
        let factory = SimEncoderFactory::supporting(["video/mp4"]);
        let err = negotiate_profile(&factory).unwrap_err();
        assert!(matches!(
            err,
            invigil_common::error::InvigilError::Encoder { .. }
        ));
    }
}
