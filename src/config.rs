use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::log_scan::scanner::{
    DEFAULT_BOUNDARY_MARKER, DEFAULT_COMBAT_MARKER, DEFAULT_DURATION_WINDOW, DEFAULT_EXIT_MARKER,
};
use crate::log_scan::{OutcomeRule, ScannerConfig};
use crate::store::{MatchStore, DEFAULT_WINS_FOR_VICTORY};

const APP_DIR: &str = "SessionTelemetry";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Marker for the combat -> replay transition that closes a round
    pub boundary_marker: String,

    /// Marker whose presence before a boundary means the round was won
    pub exit_marker: String,

    /// Ignore ASCII case when matching `exit_marker`
    pub exit_marker_case_insensitive: bool,

    /// Marker for entering combat
    pub combat_marker: String,

    pub outcome_rule: OutcomeRule,

    /// How many lines before a boundary to search for a combat duration
    pub duration_window: usize,

    /// Directory searched for the newest `*.log` when no path is given
    pub log_dir: Option<String>,

    /// Match store location, defaults to the config directory
    pub store_path: Option<String>,

    /// Where to also write the text report
    pub report_path: Option<String>,

    /// Wins needed for a finished run to count as a victory
    pub wins_for_victory: u32,

    /// Log tail poll interval in milliseconds
    pub tail_poll_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            boundary_marker: DEFAULT_BOUNDARY_MARKER.to_string(),
            exit_marker: DEFAULT_EXIT_MARKER.to_string(),
            exit_marker_case_insensitive: false,
            combat_marker: DEFAULT_COMBAT_MARKER.to_string(),
            outcome_rule: OutcomeRule::default(),
            duration_window: DEFAULT_DURATION_WINDOW,
            log_dir: None,
            store_path: None,
            report_path: None,
            wins_for_victory: DEFAULT_WINS_FOR_VICTORY,
            tail_poll_ms: 250,
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from the platform config directory.
    /// Creates default config if file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = TelemetryConfig::default();
            config.save_to(path)?;
            tracing::info!("Created default config at: {}", path.display());
            return Ok(config);
        }

        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::LoadFailed {
                path: path.display().to_string(),
                source,
            }
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: TelemetryConfig =
            serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to the platform config directory
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::SaveFailed {
                path: path.display().to_string(),
                source,
            }
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;
        Ok(())
    }

    /// `<config dir>/SessionTelemetry/config.json`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Directory for the application's own log files
    pub fn app_log_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("logs"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, marker) in [
            ("boundary_marker", &self.boundary_marker),
            ("exit_marker", &self.exit_marker),
            ("combat_marker", &self.combat_marker),
        ] {
            if marker.is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }

        if self.duration_window == 0 {
            return Err(ConfigError::Invalid(
                "duration_window must be at least 1".to_string(),
            ));
        }

        if let OutcomeRule::LookBack { offset: 0 } = self.outcome_rule {
            return Err(ConfigError::Invalid(
                "look_back offset must be at least 1".to_string(),
            ));
        }

        if self.tail_poll_ms == 0 {
            return Err(ConfigError::Invalid(
                "tail_poll_ms must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            boundary_marker: self.boundary_marker.clone(),
            exit_marker: self.exit_marker.clone(),
            combat_marker: self.combat_marker.clone(),
            outcome_rule: self.outcome_rule,
            duration_window: self.duration_window,
            exit_marker_case_insensitive: self.exit_marker_case_insensitive,
        }
    }

    /// Resolved match store location
    pub fn store_path(&self) -> Option<PathBuf> {
        match &self.store_path {
            Some(path) => Some(PathBuf::from(path)),
            None => MatchStore::default_path(),
        }
    }

    pub fn tail_poll_interval(&self) -> Duration {
        Duration::from_millis(self.tail_poll_ms)
    }
}
