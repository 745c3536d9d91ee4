//! Configuration loading
//!
//! Bootstrap configuration comes from a small TOML file; everything that
//! can change at runtime (autoplay toggle, POI set) flows through the
//! engine's event inputs instead. Missing keys fall back to built-in
//! defaults so an empty file is a valid configuration.
//!
//! Settings sources priority:
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Bootstrap configuration loaded from a TOML file
///
/// These settings cannot change during runtime; the process must restart
/// to pick up changes.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Proximity threshold in meters; a POI within this distance of the
    /// user is considered "in range"
    #[serde(default = "default_threshold_m")]
    pub proximity_threshold_m: f64,

    /// Whether autoplay starts enabled
    #[serde(default)]
    pub autoplay_enabled: bool,

    /// Event bus channel capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_threshold_m() -> f64 {
    10.0
}

fn default_event_capacity() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_m: default_threshold_m(),
            autoplay_enabled: false,
            event_capacity: default_event_capacity(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Load configuration from a TOML file, validating values
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid TOML in {}: {e}", path.display())))?;
        config.validate()?;
        info!(
            "Loaded config from {}: threshold {}m, autoplay {}",
            path.display(),
            config.proximity_threshold_m,
            config.autoplay_enabled
        );
        Ok(config)
    }

    /// Load from a file if present, otherwise built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.proximity_threshold_m.is_finite() || self.proximity_threshold_m <= 0.0 {
            return Err(Error::Config(format!(
                "proximity_threshold_m must be positive, got {}",
                self.proximity_threshold_m
            )));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be nonzero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.proximity_threshold_m, 10.0);
        assert!(!config.autoplay_enabled);
        assert_eq!(config.event_capacity, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
proximity_threshold_m = 25.0
autoplay_enabled = true
event_capacity = 32

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = TomlConfig::load(file.path()).unwrap();
        assert_eq!(config.proximity_threshold_m, 25.0);
        assert!(config.autoplay_enabled);
        assert_eq!(config.event_capacity, 32);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = TomlConfig::load(file.path()).unwrap();
        assert_eq!(config.proximity_threshold_m, 10.0);
    }

    #[test]
    fn test_rejects_nonpositive_threshold() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "proximity_threshold_m = 0.0").unwrap();
        assert!(TomlConfig::load(file.path()).is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "proximity_threshold_m = -3.0").unwrap();
        assert!(TomlConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(TomlConfig::load(Path::new("/nonexistent/earshot.toml")).is_err());
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = TomlConfig::load_or_default(None).unwrap();
        assert_eq!(config.event_capacity, 100);
    }
}
