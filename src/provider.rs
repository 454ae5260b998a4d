//! # Capture Provider Module
//!
//! The seam between the capture core and the real device recognizers. The
//! actual OCR engine, speech recognizer and optional network normalization
//! service live behind [`CaptureProvider`]; production implementations and
//! test doubles drive the exact same session logic through this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::capture_errors::ChannelError;
use crate::product::CaptureMethod;

/// The device a provider needs exclusive access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Camera,
    Microphone,
}

/// What a provider can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderCapability {
    Scanner,
    SpeechRecognizer,
}

impl ProviderCapability {
    /// The device this capability occupies while a session is live.
    pub fn device(&self) -> DeviceKind {
        match self {
            ProviderCapability::Scanner => DeviceKind::Camera,
            ProviderCapability::SpeechRecognizer => DeviceKind::Microphone,
        }
    }

    /// Whether this capability serves the given capture method.
    pub fn serves(&self, method: CaptureMethod) -> bool {
        matches!(
            (self, method),
            (ProviderCapability::Scanner, CaptureMethod::Scanner)
                | (ProviderCapability::SpeechRecognizer, CaptureMethod::Voice)
        )
    }
}

/// The raw artifact a capture yields before recognition: a camera frame for
/// the scanner, a finished recording for speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureArtifact {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Raw recognized content, before normalization and validation.
///
/// Scanners that segment the label themselves may pass the price fragment
/// separately in `price_hint`; the pipeline prefers it over re-scanning the
/// full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCapture {
    /// The recognized text (label text or transcript)
    pub text: String,
    /// Separately recognized price fragment, when the channel provides one
    pub price_hint: Option<String>,
}

/// A single-shot capture channel.
///
/// Both methods are cancellable through the session's token and must return
/// promptly once it fires; the session discards any result that arrives
/// after cancellation anyway.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// What this provider recognizes, and thus which device it occupies.
    fn capability(&self) -> ProviderCapability;

    /// Obtain the raw artifact: runs while the session is `Active` and is
    /// paced by the user (aiming the camera, speaking), so it carries no
    /// deadline of its own.
    async fn acquire_artifact(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CaptureArtifact, ChannelError>;

    /// Recognize the artifact into raw text. One recognition per processing
    /// cycle; the session bounds this call with its processing deadline.
    async fn recognize(
        &self,
        artifact: CaptureArtifact,
        cancel: &CancellationToken,
    ) -> Result<RawCapture, ChannelError>;
}
