//! Configuration loading and validation for the `confseal` command.
//!
//! Values are read from `CONFSEAL_*` environment variables at startup; command
//! line flags override them afterwards.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Validated command configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Name of the environment variable holding the passphrase.
    #[serde(default = "default_key_env")]
    pub key_env: String,

    /// Key file read when the passphrase variable is unset.
    /// Defaults to `~/.confseal-key`.
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// Tracing log level (e.g. `"warn"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_key_env() -> String {
    "CONFSEAL_KEY".into()
}
fn default_log_level() -> String {
    "warn".into()
}

/// `~/.confseal-key`, if a home directory can be determined.
pub fn default_key_file() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".confseal-key"))
}

impl Config {
    /// Load and validate configuration from `CONFSEAL_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix("CONFSEAL"))
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let mut c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        if c.key_file.is_none() {
            c.key_file = default_key_file();
        }
        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.key_env, "CONFSEAL_KEY_ENV")?;
        ensure_non_empty(&self.log_level, "CONFSEAL_LOG_LEVEL")?;
        if let Some(path) = &self.key_file {
            if path.as_os_str().is_empty() {
                anyhow::bail!("CONFSEAL_KEY_FILE must not be empty when set");
            }
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} must not be empty");
    }
    Ok(())
}
