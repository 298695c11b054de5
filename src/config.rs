use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::Validate;

use crate::models::{DepartmentPolicy, MatchPass};

/// Env var naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "ROSTER_MATCH_CONFIG";

/// Errors that can occur while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Settings {
    #[serde(default)]
    pub roster: RosterSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    #[validate(nested)]
    pub matching: MatchingSettings,
    #[serde(default)]
    #[validate(nested)]
    pub notify: NotifySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterSettings {
    #[serde(default = "default_roster_path")]
    pub path: PathBuf,
    /// Header renames applied before columns are interpreted
    #[serde(default)]
    pub column_aliases: Vec<ColumnAlias>,
    /// Columns that never become match attributes
    #[serde(default)]
    pub drop_columns: Vec<String>,
}

impl Default for RosterSettings {
    fn default() -> Self {
        Self {
            path: default_roster_path(),
            column_aliases: Vec::new(),
            drop_columns: Vec::new(),
        }
    }
}

/// Maps a raw roster header (compared case-insensitively) to a column name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnAlias {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistorySettings {
    #[serde(default = "default_history_path")]
    pub path: PathBuf,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            path: default_history_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MatchingSettings {
    #[serde(default = "default_primary_department")]
    #[validate(length(min = 1))]
    pub primary_department: String,
    #[serde(default)]
    pub secondary_departments: Vec<String>,
    #[serde(default = "default_passes")]
    #[validate(length(min = 1))]
    #[validate(nested)]
    pub passes: Vec<MatchPass>,
}

impl MatchingSettings {
    pub fn department_policy(&self) -> DepartmentPolicy {
        DepartmentPolicy {
            primary: self.primary_department.clone(),
            secondary: self.secondary_departments.clone(),
        }
    }

    /// Every attribute referenced by a pass, deduplicated, in first-use order
    pub fn required_attributes(&self) -> Vec<String> {
        let mut attributes: Vec<String> = Vec::new();
        for criterion in self.passes.iter().flat_map(|p| p.criteria.iter()) {
            if !attributes.contains(criterion) {
                attributes.push(criterion.clone());
            }
        }
        attributes
    }
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            primary_department: default_primary_department(),
            secondary_departments: Vec::new(),
            passes: default_passes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NotifySettings {
    #[serde(default = "default_notify_host")]
    #[validate(length(min = 1))]
    pub host: String,
    #[serde(default = "default_notify_port")]
    #[validate(range(min = 1))]
    pub port: u16,
    #[serde(default = "default_notify_from")]
    #[validate(email)]
    pub from: String,
    #[serde(default = "default_notify_subject")]
    pub subject: String,
    pub timeout_secs: Option<u64>,
    /// Log notifications instead of talking to the relay
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            host: default_notify_host(),
            port: default_notify_port(),
            from: default_notify_from(),
            subject: default_notify_subject(),
            timeout_secs: None,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_roster_path() -> PathBuf { PathBuf::from("roster.csv") }
fn default_history_path() -> PathBuf { PathBuf::from("past_matches.txt") }
fn default_primary_department() -> String { "operations".to_string() }
fn default_notify_host() -> String { "localhost".to_string() }
fn default_notify_port() -> u16 { 1025 }
fn default_notify_from() -> String { "MatchingSystem@matching.com".to_string() }
fn default_notify_subject() -> String { "Your new match".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

/// Exact matches first, then single-attribute fallbacks, then the same
/// progression inside the secondary group
fn default_passes() -> Vec<MatchPass> {
    vec![
        MatchPass::cross(&["meeting_method", "office_location"]),
        MatchPass::cross(&["meeting_method"]),
        MatchPass::cross(&["office_location"]),
        MatchPass::same(&["meeting_method", "office_location"]),
        MatchPass::same(&["meeting_method"]),
    ]
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the structs
    /// 2. The file named by `ROSTER_MATCH_CONFIG`, or else
    ///    `config/default.toml` and `config/local.toml` when present
    /// 3. Environment variables (prefixed with ROSTER)
    pub fn load() -> Result<Self, SettingsError> {
        let builder = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Config::builder().add_source(File::with_name(&path)),
            Err(_) => Config::builder()
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name("config/local").required(false)),
        };

        Self::finish(builder.add_source(env_source()).build()?)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env_source())
            .build()?;

        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self, SettingsError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

// e.g., ROSTER__NOTIFY__PORT -> notify.port
fn env_source() -> Environment {
    Environment::with_prefix("ROSTER")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PairingMode;
    use std::io::Write;

    #[test]
    fn test_default_passes() {
        let passes = default_passes();
        assert_eq!(passes.len(), 5);
        assert_eq!(passes[0].criteria, vec!["meeting_method", "office_location"]);
        assert_eq!(passes[0].mode, PairingMode::CrossDepartment);
        assert_eq!(passes[4].criteria, vec!["meeting_method"]);
        assert_eq!(passes[4].mode, PairingMode::SameDepartment);
    }

    #[test]
    fn test_default_notify() {
        let notify = NotifySettings::default();
        assert_eq!(notify.host, "localhost");
        assert_eq!(notify.port, 1025);
        assert_eq!(notify.from, "MatchingSystem@matching.com");
        assert!(!notify.dry_run);
    }

    #[test]
    fn test_defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_required_attributes_dedup() {
        let matching = MatchingSettings::default();
        assert_eq!(
            matching.required_attributes(),
            vec!["meeting_method".to_string(), "office_location".to_string()]
        );
    }

    #[test]
    fn test_empty_passes_rejected() {
        let mut settings = Settings::default();
        settings.matching.passes.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_criteria_rejected() {
        let mut settings = Settings::default();
        settings.matching.passes.push(MatchPass::cross(&[]));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[roster]
path = "people.csv"
drop_columns = ["ID", "name"]

[[roster.column_aliases]]
from = "Email"
to = "email"

[matching]
primary_department = "sales"
secondary_departments = ["support"]

[[matching.passes]]
criteria = ["office_location"]
mode = "same_department"

[notify]
dry_run = true
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();

        assert_eq!(settings.roster.path, PathBuf::from("people.csv"));
        assert_eq!(settings.roster.drop_columns, vec!["ID", "name"]);
        assert_eq!(settings.roster.column_aliases[0].to, "email");
        assert_eq!(settings.matching.department_policy().primary, "sales");
        assert_eq!(settings.matching.passes, vec![MatchPass::same(&["office_location"])]);
        assert!(settings.notify.dry_run);
        assert_eq!(settings.history.path, PathBuf::from("past_matches.txt"));
    }

    // Only test in the crate that sets process environment variables
    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[notify]\nhost = \"relay.internal\"\nport = 1025").unwrap();

        std::env::set_var("ROSTER__NOTIFY__PORT", "2525");
        std::env::set_var(CONFIG_PATH_ENV, file.path());
        let from_path = Settings::load_from(file.path());
        let from_env_path = Settings::load();
        std::env::remove_var("ROSTER__NOTIFY__PORT");
        std::env::remove_var(CONFIG_PATH_ENV);

        for settings in [from_path.unwrap(), from_env_path.unwrap()] {
            assert_eq!(settings.notify.port, 2525);
            assert_eq!(settings.notify.host, "relay.internal");
        }
    }
}
