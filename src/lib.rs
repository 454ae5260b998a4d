//! # Carrinho Capture Core
//!
//! The capture-and-validation core of the Carrinho shopping-total app:
//! turns noisy raw data from a camera label scanner, a speech recognizer or
//! manual keyboard entry into a single validated (name, price) record.
//!
//! The crate owns the per-channel capture state machine and the
//! normalization/validation pipeline. Real recognizers, persistence and all
//! presentation live outside, behind [`provider::CaptureProvider`] and the
//! values this crate emits.

pub mod amount;
pub mod business_rules;
pub mod capture_config;
pub mod capture_errors;
pub mod errors;
pub mod localization;
pub mod manager;
pub mod observability;
pub mod price_parser;
pub mod product;
pub mod provider;
pub mod session;
pub mod text_normalizer;
pub mod validator;

// Re-export types for easier access
pub use amount::Amount;
pub use business_rules::BusinessRules;
pub use capture_config::CaptureConfig;
pub use capture_errors::{CaptureError, ChannelError, ScannerError, SpeechError};
pub use manager::CaptureManager;
pub use product::{CaptureMethod, CapturedProduct};
pub use provider::{CaptureArtifact, CaptureProvider, ProviderCapability, RawCapture};
pub use session::{CaptureSession, CaptureState, FallbackIntent};
pub use validator::{ProductValidator, ValidationError, ValidationResult};
