//! # Capture Error Taxonomy Module
//!
//! Each capture channel fails in its own vocabulary: the scanner reports
//! camera problems, the speech recognizer reports recording problems, the
//! optional normalization service reports network problems. Presentation
//! only ever sees the canonical six-kind [`CaptureError`]; the classifiers
//! in this module are the total mappings from every channel-specific error
//! onto that taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::localization::t_or;

/// The canonical capture failure taxonomy shown to the user.
///
/// Every variant carries presentation material: a localized title and
/// suggestion (with built-in Portuguese fallback labels), and an icon
/// identifier for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureError {
    PermissionDenied,
    DeviceUnavailable,
    RecognitionFailed,
    Timeout,
    InvalidData,
    NetworkUnavailable,
}

impl CaptureError {
    /// Localization key for the error title
    pub fn title_key(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => "error-permission-denied-title",
            CaptureError::DeviceUnavailable => "error-device-unavailable-title",
            CaptureError::RecognitionFailed => "error-recognition-failed-title",
            CaptureError::Timeout => "error-timeout-title",
            CaptureError::InvalidData => "error-invalid-data-title",
            CaptureError::NetworkUnavailable => "error-network-unavailable-title",
        }
    }

    /// Localization key for the recovery suggestion
    pub fn suggestion_key(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => "error-permission-denied-suggestion",
            CaptureError::DeviceUnavailable => "error-device-unavailable-suggestion",
            CaptureError::RecognitionFailed => "error-recognition-failed-suggestion",
            CaptureError::Timeout => "error-timeout-suggestion",
            CaptureError::InvalidData => "error-invalid-data-suggestion",
            CaptureError::NetworkUnavailable => "error-network-unavailable-suggestion",
        }
    }

    /// Built-in label used when the localization bundle has no title entry
    pub fn fallback_label(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => "Permissão recusada",
            CaptureError::DeviceUnavailable => "Dispositivo indisponível",
            CaptureError::RecognitionFailed => "Não foi possível reconhecer",
            CaptureError::Timeout => "Tempo esgotado",
            CaptureError::InvalidData => "Dados inválidos",
            CaptureError::NetworkUnavailable => "Sem ligação",
        }
    }

    fn fallback_suggestion(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => {
                "Autorize o acesso nas definições do dispositivo e tente novamente."
            }
            CaptureError::DeviceUnavailable => {
                "Verifique se outra aplicação está a usar a câmara ou o microfone."
            }
            CaptureError::RecognitionFailed => {
                "Aproxime a etiqueta ou fale com mais clareza e tente novamente."
            }
            CaptureError::Timeout => {
                "A operação demorou demasiado. Tente novamente ou introduza manualmente."
            }
            CaptureError::InvalidData => {
                "O texto capturado não forma um produto válido. Corrija manualmente."
            }
            CaptureError::NetworkUnavailable => {
                "Verifique a ligação à internet e tente novamente."
            }
        }
    }

    /// Localized title for display
    pub fn title(&self) -> String {
        t_or(self.title_key(), self.fallback_label())
    }

    /// Localized recovery suggestion for display
    pub fn suggestion(&self) -> String {
        t_or(self.suggestion_key(), self.fallback_suggestion())
    }

    /// Symbol identifier for the presentation layer
    pub fn icon(&self) -> &'static str {
        match self {
            CaptureError::PermissionDenied => "lock.shield",
            CaptureError::DeviceUnavailable => "video.slash",
            CaptureError::RecognitionFailed => "questionmark.circle",
            CaptureError::Timeout => "clock.badge.exclamationmark",
            CaptureError::InvalidData => "exclamationmark.triangle",
            CaptureError::NetworkUnavailable => "wifi.slash",
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fallback_label())
    }
}

/// Errors the label scanner channel can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScannerError {
    CameraUnavailable,
    PermissionDenied,
    RecognitionFailed,
    Timeout,
    InvalidData,
    NetworkUnavailable,
}

/// Errors the speech channel can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechError {
    PermissionDenied,
    RecognizerUnavailable,
    RecordingTooShort,
    TranscriptionFailed,
    MicrophoneUnavailable,
    NetworkUnavailable,
}

/// A failure as reported by a capture provider, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelError {
    Scanner(ScannerError),
    Speech(SpeechError),
    /// An error code outside the declared channel vocabularies, e.g. from
    /// the optional network normalization service
    Raw(String),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Scanner(e) => write!(f, "[SCANNER] {:?}", e),
            ChannelError::Speech(e) => write!(f, "[SPEECH] {:?}", e),
            ChannelError::Raw(code) => write!(f, "[RAW] {}", code),
        }
    }
}

/// Classify a scanner failure onto the canonical taxonomy.
pub fn classify_scanner(error: ScannerError) -> CaptureError {
    match error {
        ScannerError::CameraUnavailable => CaptureError::DeviceUnavailable,
        ScannerError::PermissionDenied => CaptureError::PermissionDenied,
        ScannerError::RecognitionFailed => CaptureError::RecognitionFailed,
        ScannerError::Timeout => CaptureError::Timeout,
        ScannerError::InvalidData => CaptureError::InvalidData,
        ScannerError::NetworkUnavailable => CaptureError::NetworkUnavailable,
    }
}

/// Classify a speech failure onto the canonical taxonomy. Many-to-one:
/// both a too-short recording and a failed transcription read as
/// recognition failures to the user.
pub fn classify_speech(error: SpeechError) -> CaptureError {
    match error {
        SpeechError::PermissionDenied => CaptureError::PermissionDenied,
        SpeechError::RecognizerUnavailable => CaptureError::DeviceUnavailable,
        SpeechError::RecordingTooShort => CaptureError::RecognitionFailed,
        SpeechError::TranscriptionFailed => CaptureError::RecognitionFailed,
        SpeechError::MicrophoneUnavailable => CaptureError::DeviceUnavailable,
        SpeechError::NetworkUnavailable => CaptureError::NetworkUnavailable,
    }
}

/// Classify a raw provider error code onto the canonical taxonomy.
///
/// Codes outside the declared domain classify to `RecognitionFailed`: the
/// mapping fails closed to the retryable kind rather than panicking or
/// inventing a device problem the user cannot act on. This default is a
/// deliberate design decision, not a guess about the unknown code.
pub fn classify_code(code: &str) -> CaptureError {
    match code {
        "permission-denied" => CaptureError::PermissionDenied,
        "device-unavailable" | "camera-unavailable" | "microphone-unavailable"
        | "recognizer-unavailable" => CaptureError::DeviceUnavailable,
        "recognition-failed" | "recording-too-short" | "transcription-failed" => {
            CaptureError::RecognitionFailed
        }
        "timeout" => CaptureError::Timeout,
        "invalid-data" => CaptureError::InvalidData,
        "network-unavailable" => CaptureError::NetworkUnavailable,
        unknown => {
            warn!("Unmapped channel error code '{}', classifying as recognition failure", unknown);
            CaptureError::RecognitionFailed
        }
    }
}

/// Classify any provider-reported failure.
pub fn classify(error: &ChannelError) -> CaptureError {
    match error {
        ChannelError::Scanner(e) => classify_scanner(*e),
        ChannelError::Speech(e) => classify_speech(*e),
        ChannelError::Raw(code) => classify_code(code),
    }
}
