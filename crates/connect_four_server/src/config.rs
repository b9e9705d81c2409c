//! Server configuration.

use connect_four::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable overriding the board width.
pub const ENV_WIDTH: &str = "CONNECT_FOUR_WIDTH";
/// Environment variable overriding the board height.
pub const ENV_HEIGHT: &str = "CONNECT_FOUR_HEIGHT";
/// Environment variable fixing the random seed.
pub const ENV_SEED: &str = "CONNECT_FOUR_SEED";
/// Environment variable overriding the log filter.
pub const ENV_LOG: &str = "CONNECT_FOUR_LOG";

/// Settings for the game service and binary.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Board width for new games.
    #[serde(default = "default_width")]
    width: usize,

    /// Board height for new games.
    #[serde(default = "default_height")]
    height: usize,

    /// Seed for play order and AI moves; entropy when unset.
    #[serde(default)]
    seed: Option<u64>,

    /// Tracing filter directive, e.g. `info` or `connect_four=debug`.
    #[serde(default = "default_log")]
    log: String,
}

fn default_width() -> usize {
    DEFAULT_WIDTH
}

fn default_height() -> usize {
    DEFAULT_HEIGHT
}

fn default_log() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            seed: None,
            log: default_log(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or the
    /// board size is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        info!(width = config.width, height = config.height, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if given, else defaults, then applies `.env` and
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unreadable files or malformed values.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an override does not parse or the
    /// resulting board size is invalid.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(width) = lookup(ENV_WIDTH) {
            self.width = parse_var(ENV_WIDTH, &width)?;
        }
        if let Some(height) = lookup(ENV_HEIGHT) {
            self.height = parse_var(ENV_HEIGHT, &height)?;
        }
        if let Some(seed) = lookup(ENV_SEED) {
            self.seed = Some(parse_var(ENV_SEED, &seed)?);
        }
        if let Some(log) = lookup(ENV_LOG) {
            self.log = log;
        }
        self.validate()?;
        Ok(self)
    }

    /// Replaces the seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::new(format!(
                "Board must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::new(format!("Invalid {}='{}': {}", key, value, e)))
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(*config.width(), 7);
        assert_eq!(*config.height(), 6);
        assert_eq!(*config.seed(), None);
        assert_eq!(config.log(), "info");
    }

    #[test]
    fn test_overrides_apply() {
        let config = ServerConfig::default()
            .with_overrides(env(&[(ENV_WIDTH, "9"), (ENV_SEED, " 42 "), (ENV_LOG, "debug")]))
            .expect("overrides");
        assert_eq!(*config.width(), 9);
        assert_eq!(*config.height(), 6);
        assert_eq!(*config.seed(), Some(42));
        assert_eq!(config.log(), "debug");
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let err = ServerConfig::default()
            .with_overrides(env(&[(ENV_HEIGHT, "tall")]))
            .expect_err("not a number");
        assert!(err.message.contains(ENV_HEIGHT));
    }

    #[test]
    fn test_zero_width_is_rejected() {
        let result = ServerConfig::default().with_overrides(env(&[(ENV_WIDTH, "0")]));
        assert!(result.is_err());
    }
}
