//! Session metadata and quality settings.

use serde::{Deserialize, Serialize};

/// Which exam part this session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamPart {
    #[serde(rename = "Part 1")]
    Part1,
    #[serde(rename = "Part 2")]
    Part2,
}

impl ExamPart {
    /// Display form used on the wire and in rosters.
    pub fn display_name(&self) -> &'static str {
        match self {
            ExamPart::Part1 => "Part 1",
            ExamPart::Part2 => "Part 2",
        }
    }

    /// Short prefix used in storage object names.
    pub fn prefix(&self) -> &'static str {
        match self {
            ExamPart::Part1 => "part1",
            ExamPart::Part2 => "part2",
        }
    }

    /// Lenient parse: anything that is not exactly "Part 2" is Part 1.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim() == "Part 2" {
            ExamPart::Part2
        } else {
            ExamPart::Part1
        }
    }
}

impl std::fmt::Display for ExamPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Candidate identity attached to delivered artifacts.
///
/// Fixed at admission time and never mutated for the life of the
/// session; the recording core itself does not read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub part: ExamPart,
}

impl SessionMetadata {
    /// Identity key used by the storage boundary: the trimmed email,
    /// or a fixed placeholder when the candidate has none.
    pub fn student_id(&self) -> String {
        let email = self.email.trim();
        if email.is_empty() {
            "student".to_string()
        } else {
            email.to_string()
        }
    }
}

/// Recording quality presets offered to candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualitySetting {
    /// 2.5 Mbps, the default.
    High,
    /// 1.5 Mbps for constrained uplinks.
    Medium,
    /// 1.25 Mbps, smallest files.
    Compact,
}

impl QualitySetting {
    /// Target video bitrate in bits per second.
    pub fn bitrate_bps(&self) -> u32 {
        match self {
            QualitySetting::High => 2_500_000,
            QualitySetting::Medium => 1_500_000,
            QualitySetting::Compact => 1_250_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_serde_uses_display_names() {
        let json = serde_json::to_string(&ExamPart::Part2).unwrap();
        assert_eq!(json, r#""Part 2""#);
        let back: ExamPart = serde_json::from_str(r#""Part 1""#).unwrap();
        assert_eq!(back, ExamPart::Part1);
    }

    #[test]
    fn part_parse_defaults_to_part1() {
        assert_eq!(ExamPart::parse_lenient("Part 2"), ExamPart::Part2);
        assert_eq!(ExamPart::parse_lenient(" Part 2 "), ExamPart::Part2);
        assert_eq!(ExamPart::parse_lenient("Part 1"), ExamPart::Part1);
        assert_eq!(ExamPart::parse_lenient("part 2"), ExamPart::Part1);
        assert_eq!(ExamPart::parse_lenient(""), ExamPart::Part1);
    }

    #[test]
    fn student_id_falls_back_when_email_is_blank() {
        let with_email = SessionMetadata {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: " ada@example.com ".into(),
            part: ExamPart::Part1,
        };
        assert_eq!(with_email.student_id(), "ada@example.com");

        let without_email = SessionMetadata {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "   ".into(),
            part: ExamPart::Part1,
        };
        assert_eq!(without_email.student_id(), "student");
    }

    #[test]
    fn quality_presets_map_to_bitrates() {
        assert_eq!(QualitySetting::High.bitrate_bps(), 2_500_000);
        assert_eq!(QualitySetting::Medium.bitrate_bps(), 1_500_000);
        assert_eq!(QualitySetting::Compact.bitrate_bps(), 1_250_000);
    }
}
