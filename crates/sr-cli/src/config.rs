//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sr_core::{ClearPolicy, DEFAULT_ROLLOVER_PERIOD, DEFAULT_TELEMETRY_CAPACITY};
use sr_xlsx::DEFAULT_FILE_NAME;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file holding the report mirror.
    pub database_path: PathBuf,

    /// Directory exported spreadsheets are written to.
    pub export_dir: PathBuf,

    /// File name of the exported spreadsheet.
    pub export_file_name: String,

    /// Seconds between scheduled export-and-clear rollovers.
    pub rollover_period_secs: u64,

    /// Number of recent events kept for live display.
    pub telemetry_capacity: usize,

    /// Whether a rollover clears the report after a failed export.
    pub clear_policy: ClearPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("export_dir", &self.export_dir)
            .field("export_file_name", &self.export_file_name)
            .field("rollover_period_secs", &self.rollover_period_secs)
            .field("telemetry_capacity", &self.telemetry_capacity)
            .field("clear_policy", &self.clear_policy)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("sr.db"),
            export_dir: data_dir.join("exports"),
            export_file_name: DEFAULT_FILE_NAME.to_string(),
            rollover_period_secs: DEFAULT_ROLLOVER_PERIOD.as_secs(),
            telemetry_capacity: DEFAULT_TELEMETRY_CAPACITY,
            clear_policy: ClearPolicy::default(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (SR_*)
        figment = figment.merge(Env::prefixed("SR_"));

        figment.extract()
    }

    /// The rollover period. Zero is bumped to one second.
    pub fn rollover_period(&self) -> Duration {
        Duration::from_secs(self.rollover_period_secs.max(1))
    }
}

/// Returns the platform-specific config directory for sr.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sr"))
}

/// Returns the platform-specific data directory for sr.
///
/// On Linux: `~/.local/share/sr`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("sr"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_dirs_data_path_ends_with_sr() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "sr");
    }

    #[test]
    fn test_default_config_uses_data_dir() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("sr.db"));
        assert_eq!(config.export_dir, data_dir.join("exports"));
        assert_eq!(config.export_file_name, "data.xlsx");
        assert_eq!(config.rollover_period(), Duration::from_secs(86_400));
        assert_eq!(config.telemetry_capacity, 10);
        assert_eq!(config.clear_policy, ClearPolicy::Always);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
database_path = "/tmp/sr-test.db"
rollover_period_secs = 60
clear_policy = "on_export_success"
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/sr-test.db"));
        assert_eq!(config.rollover_period(), Duration::from_secs(60));
        assert_eq!(config.clear_policy, ClearPolicy::OnExportSuccess);
        assert_eq!(config.export_file_name, "data.xlsx");
    }

    #[test]
    fn test_unknown_clear_policy_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"clear_policy = "sometimes""#).unwrap();
        file.flush().unwrap();

        assert!(Config::load_from(Some(file.path())).is_err());
    }

    #[test]
    fn test_zero_rollover_period_is_clamped() {
        let config = Config {
            rollover_period_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.rollover_period(), Duration::from_secs(1));
    }
}
