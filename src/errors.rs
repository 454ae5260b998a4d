//! # Application Error Types
//!
//! This module defines common error types used throughout the capture core.
//! It provides structured error handling for configuration, localization and
//! session-lifecycle failures. Data-quality and device failures have their
//! own taxonomies (`ValidationError`, `CaptureError`) and never surface here.

use std::fmt;

use crate::product::CaptureMethod;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Localization bundle errors
    Localization(String),
    /// Illegal session state transitions
    IllegalTransition { from: &'static str, event: &'static str },
    /// Capture requested for a method that has no session support
    UnsupportedMethod(CaptureMethod),
    /// No provider registered for the requested capture method
    ProviderMissing(CaptureMethod),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Localization(msg) => write!(f, "[L10N] {}", msg),
            AppError::IllegalTransition { from, event } => {
                write!(f, "[SESSION] event '{}' is not legal in state '{}'", event, from)
            }
            AppError::UnsupportedMethod(method) => {
                write!(f, "[SESSION] capture sessions do not support method '{:?}'", method)
            }
            AppError::ProviderMissing(method) => {
                write!(f, "[SESSION] no capture provider registered for method '{:?}'", method)
            }
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting
pub mod error_logging {
    use tracing::error;

    /// Log session lifecycle errors with session context
    pub fn log_session_error(
        error: &impl std::fmt::Display,
        operation: &str,
        session_id: u64,
        retry_count: Option<u32>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            session_id = %session_id,
            retry_count = ?retry_count,
            "Capture session operation failed"
        );
    }

    /// Log validation failures with input context
    pub fn log_validation_error(
        error: &impl std::fmt::Display,
        operation: &str,
        input_type: &str,
        input_value: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            input_type = %input_type,
            input_value = ?input_value.map(|v| if v.len() > 100 { format!("{}...", &v[..100]) } else { v.to_string() }),
            "Validation failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
