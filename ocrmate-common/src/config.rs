//! Configuration loading and config-file resolution
//!
//! Config file priority order:
//! 1. Command-line argument (highest priority)
//! 2. `OCRMATE_CONFIG` environment variable
//! 3. Platform config directory (`~/.config/ocrmate/config.toml` on Linux)
//! 4. Built-in defaults (no file)
//!
//! Individual verification settings can additionally be overridden from the
//! environment; command-line flags are applied on top by the binaries.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "OCRMATE_CONFIG";

/// Environment override for the conflict-resolution policy name
pub const POLICY_ENV_VAR: &str = "OCRMATE_CONFLICT_POLICY";

/// Environment override for the human-review threshold
pub const HUMAN_REVIEW_ENV_VAR: &str = "OCRMATE_HUMAN_REVIEW_THRESHOLD";

/// Environment override for the auto-approve threshold
pub const AUTO_APPROVE_ENV_VAR: &str = "OCRMATE_AUTO_APPROVE_THRESHOLD";

/// Complete TOML configuration file
///
/// Every section and key is optional. A missing or empty file yields defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Verification settings (optional)
    #[serde(default)]
    pub verification: VerificationConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Verification settings as written in TOML
///
/// Values stay optional here; the verification crate owns the defaults and
/// turns the policy name into its typed policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Conflict policy name (higher_confidence, prefer_ocr, prefer_llm,
    /// weighted_average, human_review)
    #[serde(default)]
    pub conflict_policy: Option<String>,

    /// Source favored on confidence ties under higher_confidence ("llm" or "ocr")
    #[serde(default)]
    pub tie_break: Option<String>,

    /// Overall confidence below which a document needs human review
    #[serde(default)]
    pub human_review_threshold: Option<f64>,

    /// Overall confidence at or above which a document is auto-approved
    #[serde(default)]
    pub auto_approve_threshold: Option<f64>,

    /// Per-extractor timeout in milliseconds
    #[serde(default)]
    pub extractor_timeout_ms: Option<u64>,
}

impl VerificationConfig {
    /// Apply `OCRMATE_*` environment overrides on top of file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(policy) = std::env::var(POLICY_ENV_VAR) {
            debug!("Conflict policy overridden from environment: {}", policy);
            self.conflict_policy = Some(policy);
        }
        if let Some(value) = env_f64(HUMAN_REVIEW_ENV_VAR)? {
            self.human_review_threshold = Some(value);
        }
        if let Some(value) = env_f64(AUTO_APPROVE_ENV_VAR)? {
            self.auto_approve_threshold = Some(value);
        }
        Ok(())
    }

    /// Check ranges of whichever values are present
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("human_review_threshold", self.human_review_threshold),
            ("auto_approve_threshold", self.auto_approve_threshold),
        ] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(Error::Config(format!(
                        "{} must be within [0, 1], got {}",
                        name, v
                    )));
                }
            }
        }

        if let (Some(review), Some(approve)) =
            (self.human_review_threshold, self.auto_approve_threshold)
        {
            if review > approve {
                return Err(Error::Config(format!(
                    "human_review_threshold ({}) exceeds auto_approve_threshold ({})",
                    review, approve
                )));
            }
        }

        if self.extractor_timeout_ms == Some(0) {
            return Err(Error::Config(
                "extractor_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_f64(name: &str) -> Result<Option<f64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{}='{}' is not a number: {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}

/// Resolves which config file (if any) applies
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Resolve the config file path by priority; `None` means built-in defaults
    pub fn resolve_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path().filter(|p| p.exists())
    }

    /// Load the resolved config, applying environment overrides
    ///
    /// An explicitly named file (CLI or environment) must exist and parse.
    /// A missing default file is not an error: defaults are used.
    pub fn load(&self) -> Result<TomlConfig> {
        let explicit = self.cli_path.is_some() || std::env::var(CONFIG_ENV_VAR).is_ok();

        let mut config = match self.resolve_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            Some(path) if explicit => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            _ => {
                warn!("No configuration file found, using built-in defaults");
                TomlConfig::default()
            }
        };

        config.verification.apply_env_overrides()?;
        config.verification.validate()?;
        Ok(config)
    }
}

/// Platform default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ocrmate").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}
