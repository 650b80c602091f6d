//! Runtime configuration for the home core.
//!
//! Defaults match the shipped mobile build; `from_env` lets shells and tests
//! override the storage path, advice endpoint and name validation.

use crate::remote::advice_client::DEFAULT_ADVICE_BASE_URL;
use std::path::PathBuf;
use std::time::Duration;

const DB_FILE_NAME: &str = "homeapp.sqlite3";
const ENV_DB_PATH: &str = "HOMEAPP_DB_PATH";
const ENV_ADVICE_URL: &str = "HOMEAPP_ADVICE_URL";
const ENV_STRICT_NAMES: &str = "HOMEAPP_STRICT_NAMES";

/// User-facing texts produced by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeLabels {
    /// Advice text shown until the first fetch resolves.
    pub advice_loading: String,
    /// Advice text shown when the fetch fails.
    pub advice_fallback: String,
    /// Title of every deadline reminder.
    pub overdue_title: String,
    pub channel_name: String,
    pub channel_description: String,
}

impl Default for HomeLabels {
    fn default() -> Self {
        Self {
            advice_loading: "Loading today's tip...".to_string(),
            advice_fallback: "Couldn't load a tip, but you're doing great anyway!".to_string(),
            overdue_title: "Overdue task".to_string(),
            channel_name: "Task reminders".to_string(),
            channel_description: "Deadline reminders for household chores".to_string(),
        }
    }
}

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeConfig {
    pub db_path: PathBuf,
    pub advice_base_url: String,
    pub advice_timeout: Duration,
    /// Upper bound on how long the reminder sweeper sleeps.
    pub reminder_poll_interval: Duration,
    /// How long the members feed survives without subscribers.
    pub members_idle_grace: Duration,
    /// Rejects empty member names when enabled.
    pub reject_empty_member_names: bool,
    pub labels: HomeLabels,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DB_FILE_NAME),
            advice_base_url: DEFAULT_ADVICE_BASE_URL.to_string(),
            advice_timeout: Duration::from_secs(10),
            reminder_poll_interval: Duration::from_secs(30),
            members_idle_grace: Duration::from_secs(5),
            reject_empty_member_names: false,
            labels: HomeLabels::default(),
        }
    }
}

impl HomeConfig {
    /// Default configuration with the database placed in `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_path: data_dir.into().join(DB_FILE_NAME),
            ..Self::default()
        }
    }

    /// Applies `HOMEAPP_*` environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = non_empty_env(ENV_DB_PATH) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(url) = non_empty_env(ENV_ADVICE_URL) {
            self.advice_base_url = url;
        }
        if let Some(flag) = non_empty_env(ENV_STRICT_NAMES) {
            self.reject_empty_member_names = parse_flag(&flag);
        }
        self
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::{parse_flag, HomeConfig};
    use std::time::Duration;

    #[test]
    fn defaults_match_shipped_behavior() {
        let config = HomeConfig::default();
        assert_eq!(config.members_idle_grace, Duration::from_secs(5));
        assert!(!config.reject_empty_member_names);
        assert!(config.advice_base_url.starts_with("https://"));
        assert!(!config.labels.advice_fallback.is_empty());
    }

    #[test]
    fn in_dir_places_database_file_in_directory() {
        let config = HomeConfig::in_dir("/data/home");
        assert!(config.db_path.starts_with("/data/home"));
        assert!(config.db_path.ends_with("homeapp.sqlite3"));
    }

    #[test]
    fn parse_flag_accepts_common_truthy_values() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("off"));
    }
}
