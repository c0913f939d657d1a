//! Collaborator stores consumed at the session boundary.
//!
//! The recording core never reads secrets or writes logs itself; it
//! goes through these seams. Real deployments implement them against
//! whatever settings service and session log they run.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use invigil_common::error::InvigilResult;
use invigil_session::metadata::ExamPart;
use serde::Serialize;

pub const ACCESS_CODE_ENV: &str = "INVIGIL_ACCESS_CODE";
pub const STOP_PASSWORD_PART1_ENV: &str = "INVIGIL_STOP_PASSWORD_PART1";
pub const STOP_PASSWORD_PART2_ENV: &str = "INVIGIL_STOP_PASSWORD_PART2";

/// Proctoring secrets looked up at admission and stop time.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The single stored access code, if one has been configured.
    async fn access_code(&self) -> InvigilResult<Option<String>>;

    /// The stop password configured for one exam part.
    async fn stop_password(&self, part: ExamPart) -> InvigilResult<Option<String>>;
}

/// Session log written once per admitted candidate.
#[async_trait]
pub trait RosterStore: Send + Sync {
    async fn append(&self, entry: RosterEntry) -> InvigilResult<()>;
}

/// One admitted session in the roster.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub part: ExamPart,
    pub started_at: DateTime<Utc>,
}

/// Settings sourced from the process environment, for single-host
/// deployments and local operation. Empty variables count as unset.
pub struct EnvSettingsStore;

#[async_trait]
impl SettingsStore for EnvSettingsStore {
    async fn access_code(&self) -> InvigilResult<Option<String>> {
        Ok(read_env(ACCESS_CODE_ENV))
    }

    async fn stop_password(&self, part: ExamPart) -> InvigilResult<Option<String>> {
        let var = match part {
            ExamPart::Part1 => STOP_PASSWORD_PART1_ENV,
            ExamPart::Part2 => STOP_PASSWORD_PART2_ENV,
        };
        Ok(read_env(var))
    }
}

fn read_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|value| !value.is_empty())
}

/// Fixed in-memory settings for tests.
#[derive(Default)]
pub struct SimSettingsStore {
    access_code: Option<String>,
    part1_password: Option<String>,
    part2_password: Option<String>,
}

impl SimSettingsStore {
    /// A store with nothing configured.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn configured(
        access_code: impl Into<String>,
        part1_password: impl Into<String>,
        part2_password: impl Into<String>,
    ) -> Self {
        Self {
            access_code: Some(access_code.into()),
            part1_password: Some(part1_password.into()),
            part2_password: Some(part2_password.into()),
        }
    }
}

#[async_trait]
impl SettingsStore for SimSettingsStore {
    async fn access_code(&self) -> InvigilResult<Option<String>> {
        Ok(self.access_code.clone())
    }

    async fn stop_password(&self, part: ExamPart) -> InvigilResult<Option<String>> {
        let stored = match part {
            ExamPart::Part1 => &self.part1_password,
            ExamPart::Part2 => &self.part2_password,
        };
        Ok(stored.clone())
    }
}

/// In-memory roster for tests.
#[derive(Default)]
pub struct SimRoster {
    entries: Mutex<Vec<RosterEntry>>,
}

impl SimRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RosterEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl RosterStore for SimRoster {
    async fn append(&self, entry: RosterEntry) -> InvigilResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sim_settings_report_what_was_configured() {
        let empty = SimSettingsStore::unconfigured();
        assert!(empty.access_code().await.unwrap().is_none());
        assert!(empty
            .stop_password(ExamPart::Part2)
            .await
            .unwrap()
            .is_none());

        let full = SimSettingsStore::configured("open-sesame", "stop1", "stop2");
        assert_eq!(
            full.access_code().await.unwrap().as_deref(),
            Some("open-sesame")
        );
        assert_eq!(
            full.stop_password(ExamPart::Part1).await.unwrap().as_deref(),
            Some("stop1")
        );
        assert_eq!(
            full.stop_password(ExamPart::Part2).await.unwrap().as_deref(),
            Some("stop2")
        );
    }

    #[tokio::test]
    async fn env_settings_treat_empty_as_unset() {
        std::env::set_var(ACCESS_CODE_ENV, "");
        std::env::remove_var(STOP_PASSWORD_PART1_ENV);
        std::env::set_var(STOP_PASSWORD_PART2_ENV, "hush");

        let store = EnvSettingsStore;
        assert!(store.access_code().await.unwrap().is_none());
        assert!(store
            .stop_password(ExamPart::Part1)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            store.stop_password(ExamPart::Part2).await.unwrap().as_deref(),
            Some("hush")
        );

        std::env::remove_var(ACCESS_CODE_ENV);
        std::env::remove_var(STOP_PASSWORD_PART2_ENV);
    }

    #[test]
    fn roster_entries_serialize_in_wire_form() {
        let entry = RosterEntry {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            part: ExamPart::Part2,
            started_at: Utc::now(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["part"], "Part 2");
        assert!(json["startedAt"].is_string());
    }
}
