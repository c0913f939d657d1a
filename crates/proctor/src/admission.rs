//! Admission control and stop authorization.

use std::sync::Arc;

use chrono::Utc;
use invigil_common::error::{InvigilError, InvigilResult};
use invigil_session::metadata::{ExamPart, SessionMetadata};

use crate::stores::{RosterEntry, RosterStore, SettingsStore};

/// What a candidate submits to enter the exam. The part arrives as the
/// raw wire string and is parsed leniently.
#[derive(Debug, Clone)]
pub struct AdmissionForm {
    pub access_code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub part: String,
}

/// Gatekeeper in front of the session guard: admits candidates against
/// the stored access code and authorizes stops against the per-part
/// password. Admission appends exactly one roster record.
pub struct AdmissionDesk {
    settings: Arc<dyn SettingsStore>,
    roster: Arc<dyn RosterStore>,
}

impl AdmissionDesk {
    pub fn new(settings: Arc<dyn SettingsStore>, roster: Arc<dyn RosterStore>) -> Self {
        Self { settings, roster }
    }

    /// Validate the form, log the admission, and hand back the
    /// metadata the session will carry.
    pub async fn validate_and_start(&self, form: &AdmissionForm) -> InvigilResult<SessionMetadata> {
        let access_code = form.access_code.trim();
        let first_name = form.first_name.trim();
        let last_name = form.last_name.trim();
        let email = form.email.trim();
        let part = ExamPart::parse_lenient(&form.part);

        if access_code.is_empty() || first_name.is_empty() || last_name.is_empty() || email.is_empty()
        {
            return Err(InvigilError::invalid_input(
                "accessCode, firstName, lastName, and email are required",
            ));
        }

        let stored = match self.settings.access_code().await? {
            Some(code) => code,
            None => return Err(InvigilError::not_configured("access code not configured")),
        };
        if stored != access_code {
            tracing::warn!(email = %email, "Admission refused: incorrect access code");
            return Err(InvigilError::unauthorized("incorrect access code"));
        }

        let metadata = SessionMetadata {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            part,
        };
        self.roster
            .append(RosterEntry {
                first_name: metadata.first_name.clone(),
                last_name: metadata.last_name.clone(),
                email: metadata.email.clone(),
                part,
                started_at: Utc::now(),
            })
            .await?;
        tracing::info!(email = %metadata.email, part = %part, "Candidate admitted");
        Ok(metadata)
    }

    /// Check the invigilator's stop password for one part. An explicit
    /// stop may only run once this has passed.
    pub async fn authorize_stop(&self, part: ExamPart, password: &str) -> InvigilResult<()> {
        let password = password.trim();
        let stored = match self.settings.stop_password(part).await? {
            Some(stored) => stored,
            None => return Err(InvigilError::not_configured("stop password not configured")),
        };
        if stored != password {
            tracing::warn!(part = %part, "Stop refused: incorrect password");
            return Err(InvigilError::unauthorized("incorrect password"));
        }
        tracing::info!(part = %part, "Stop authorized");
        Ok(())
    }
}
