//! # Capture Configuration Module
//!
//! Configuration for capture-session timing: the processing deadline and the
//! advisory retry backoff settings exposed to callers that pace retries.

use crate::errors::{AppError, AppResult};
use std::env;
use std::time::Duration;

pub const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_BASE_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 8000;

/// Timing configuration for capture sessions
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Deadline for the processing step (recognition + validation) in seconds
    pub processing_timeout_secs: u64,
    /// Base delay for the first suggested retry in milliseconds
    pub base_retry_delay_ms: u64,
    /// Cap on the suggested retry delay in milliseconds
    pub max_retry_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            processing_timeout_secs: DEFAULT_PROCESSING_TIMEOUT_SECS,
            base_retry_delay_ms: DEFAULT_BASE_RETRY_DELAY_MS,
            max_retry_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
        }
    }
}

impl CaptureConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(value) = env::var("CAPTURE_PROCESSING_TIMEOUT_SECS") {
            config.processing_timeout_secs = value.parse().map_err(|_| {
                AppError::Config(
                    "CAPTURE_PROCESSING_TIMEOUT_SECS must be a valid number".to_string(),
                )
            })?;
        }
        if let Ok(value) = env::var("CAPTURE_BASE_RETRY_DELAY_MS") {
            config.base_retry_delay_ms = value.parse().map_err(|_| {
                AppError::Config("CAPTURE_BASE_RETRY_DELAY_MS must be a valid number".to_string())
            })?;
        }
        if let Ok(value) = env::var("CAPTURE_MAX_RETRY_DELAY_MS") {
            config.max_retry_delay_ms = value.parse().map_err(|_| {
                AppError::Config("CAPTURE_MAX_RETRY_DELAY_MS must be a valid number".to_string())
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.processing_timeout_secs == 0 {
            return Err(AppError::Config(
                "processing_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.base_retry_delay_ms == 0 {
            return Err(AppError::Config(
                "base_retry_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_retry_delay_ms < self.base_retry_delay_ms {
            return Err(AppError::Config(format!(
                "max_retry_delay_ms ({}) must be >= base_retry_delay_ms ({})",
                self.max_retry_delay_ms, self.base_retry_delay_ms
            )));
        }
        Ok(())
    }

    /// The processing deadline as a `Duration`.
    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_secs)
    }

    /// Suggested delay before retry number `attempt` (1-based).
    ///
    /// Exponential backoff capped at `max_retry_delay_ms`, with up to 25%
    /// random jitter to spread simultaneous retries. Advisory only — the
    /// core never sleeps on the caller's behalf and never caps attempts.
    pub fn suggested_retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let exponential = self
            .base_retry_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_retry_delay_ms);

        // Jitter to prevent thundering herd
        let jitter = rand::random::<u64>() % (exponential / 4).max(1);
        Duration::from_millis(exponential + jitter)
    }
}
