//! Resolved verification settings
//!
//! Turns the loosely typed `[verification]` TOML section into the typed
//! values the orchestrator runs with.

use crate::error::VerifyResult;
use crate::fusion::aggregator::{DEFAULT_AUTO_APPROVE_THRESHOLD, DEFAULT_HUMAN_REVIEW_THRESHOLD};
use crate::fusion::{ConflictPolicy, RoutingThresholds};
use crate::types::Source;
use ocrmate_common::config::VerificationConfig;
use ocrmate_common::Error;
use std::time::Duration;
use tracing::info;

/// Default per-extractor timeout
pub const DEFAULT_EXTRACTOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one verification run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifierSettings {
    pub policy: ConflictPolicy,
    pub human_review_threshold: f64,
    pub auto_approve_threshold: f64,
    pub extractor_timeout: Duration,
}

impl Default for VerifierSettings {
    fn default() -> Self {
        Self {
            policy: ConflictPolicy::default(),
            human_review_threshold: DEFAULT_HUMAN_REVIEW_THRESHOLD,
            auto_approve_threshold: DEFAULT_AUTO_APPROVE_THRESHOLD,
            extractor_timeout: DEFAULT_EXTRACTOR_TIMEOUT,
        }
    }
}

impl VerifierSettings {
    /// Build settings from a (validated) TOML section, defaulting absent keys
    pub fn from_config(config: &VerificationConfig) -> VerifyResult<Self> {
        let defaults = Self::default();

        let mut policy = match &config.conflict_policy {
            Some(name) => name.parse::<ConflictPolicy>().map_err(Error::Config)?,
            None => defaults.policy,
        };
        if let Some(tie_break) = &config.tie_break {
            let source = tie_break
                .parse::<Source>()
                .map_err(|e| Error::Config(format!("tie_break: {}", e)))?;
            policy = policy.with_tie_break(source);
        }

        let settings = Self {
            policy,
            human_review_threshold: config
                .human_review_threshold
                .unwrap_or(defaults.human_review_threshold),
            auto_approve_threshold: config
                .auto_approve_threshold
                .unwrap_or(defaults.auto_approve_threshold),
            extractor_timeout: config
                .extractor_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.extractor_timeout),
        };
        settings.validate()?;

        info!(
            "Verification settings: policy={}, human_review<{}, auto_approve>={}, timeout={:?}",
            settings.policy,
            settings.human_review_threshold,
            settings.auto_approve_threshold,
            settings.extractor_timeout
        );
        Ok(settings)
    }

    /// Thresholds in [0, 1], ordered, and a non-zero timeout
    pub fn validate(&self) -> VerifyResult<()> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(self.human_review_threshold) || !in_range(self.auto_approve_threshold) {
            return Err(Error::Config(format!(
                "thresholds must lie within [0, 1] (human_review={}, auto_approve={})",
                self.human_review_threshold, self.auto_approve_threshold
            ))
            .into());
        }
        if self.human_review_threshold > self.auto_approve_threshold {
            return Err(Error::Config(format!(
                "human_review_threshold ({}) exceeds auto_approve_threshold ({})",
                self.human_review_threshold, self.auto_approve_threshold
            ))
            .into());
        }
        if self.extractor_timeout.is_zero() {
            return Err(
                Error::Config("extractor timeout must be greater than zero".to_string()).into(),
            );
        }
        Ok(())
    }

    pub fn thresholds(&self) -> RoutingThresholds {
        RoutingThresholds {
            human_review: self.human_review_threshold,
            auto_approve: self.auto_approve_threshold,
        }
    }
}
