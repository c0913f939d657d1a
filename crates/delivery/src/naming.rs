//! Storage naming for delivered recordings.
//!
//! The layout in the store is one folder per student holding
//! `<part>_<date>_<time>.webm` objects. Names are computed here, on
//! the sending side, so every boundary implementation files
//! recordings identically. Timestamps use a fixed UTC+9 offset
//! regardless of where the candidate sits, keeping one exam's uploads
//! sortable as a single sequence.

use chrono::{DateTime, Duration, Utc};
use invigil_session::metadata::{ExamPart, SessionMetadata};

const STORAGE_UTC_OFFSET_HOURS: i64 = 9;
const MAX_COMPONENT_LEN: usize = 80;

/// Make a string safe for use as a path component: anything outside
/// `[A-Za-z0-9._-]` becomes `_`, capped at 80 chars, lowercased.
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .take(MAX_COMPONENT_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Folder for one student: `first_last`, or `unknown` when no name was
/// supplied at all.
pub fn student_folder(metadata: &SessionMetadata) -> String {
    if metadata.first_name.is_empty() && metadata.last_name.is_empty() {
        return "unknown".to_string();
    }
    format!(
        "{}_{}",
        sanitize_component(&metadata.first_name),
        sanitize_component(&metadata.last_name)
    )
}

/// Object name for a delivery happening now.
pub fn object_name(part: ExamPart) -> String {
    object_name_at(part, Utc::now())
}

/// Object name at an explicit instant, offset-shifted for storage.
pub fn object_name_at(part: ExamPart, at: DateTime<Utc>) -> String {
    let shifted = at + Duration::hours(STORAGE_UTC_OFFSET_HOURS);
    format!("{}_{}.webm", part.prefix(), shifted.format("%Y-%m-%d_%H-%M-%S"))
}
