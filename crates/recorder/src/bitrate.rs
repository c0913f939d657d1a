//! Video bitrate resolution.

/// Fallback bitrate when neither an override nor a configured default
/// applies: 2.5 Mbps.
pub const DEFAULT_VIDEO_BITRATE: u32 = 2_500_000;

/// Resolve the session bitrate.
///
/// Precedence: caller override, then the process-configured default,
/// then [`DEFAULT_VIDEO_BITRATE`]. A zero value at either level is
/// invalid and falls through to the next.
pub fn resolve_bitrate(override_bps: Option<u32>, configured_bps: Option<u32>) -> u32 {
    valid(override_bps)
        .or_else(|| valid(configured_bps))
        .unwrap_or(DEFAULT_VIDEO_BITRATE)
}

fn valid(value: Option<u32>) -> Option<u32> {
    value.filter(|bps| *bps > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_configured_default() {
        assert_eq!(resolve_bitrate(Some(1_250_000), Some(9_999_999)), 1_250_000);
    }

    #[test]
    fn configured_default_wins_when_no_override() {
        assert_eq!(resolve_bitrate(None, Some(1_500_000)), 1_500_000);
    }

    #[test]
    fn fallback_applies_when_nothing_is_set() {
        assert_eq!(resolve_bitrate(None, None), DEFAULT_VIDEO_BITRATE);
    }

    #[test]
    fn zero_values_are_invalid_at_every_level() {
        assert_eq!(resolve_bitrate(Some(0), Some(1_500_000)), 1_500_000);
        assert_eq!(resolve_bitrate(Some(0), Some(0)), DEFAULT_VIDEO_BITRATE);
        assert_eq!(resolve_bitrate(None, Some(0)), DEFAULT_VIDEO_BITRATE);
    }
}
