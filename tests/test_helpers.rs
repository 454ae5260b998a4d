//! # Test Helper Library
//!
//! Scripted capture provider shared by the integration tests. It drives the
//! exact same session logic as a production recognizer, which is the point:
//! test doubles and real providers are interchangeable behind the
//! `CaptureProvider` trait.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use carrinho_core::capture_errors::ChannelError;
use carrinho_core::provider::{CaptureArtifact, CaptureProvider, ProviderCapability, RawCapture};

/// One scripted provider behavior, consumed in order per attempt.
#[derive(Debug, Clone)]
pub enum Step {
    /// Recognition succeeds immediately with this content
    Recognize { text: String, price_hint: Option<String> },
    /// Recognition succeeds after a delay (for deadline tests)
    RecognizeAfterMs { delay_ms: u64, text: String },
    /// Artifact acquisition fails
    FailAcquire(ChannelError),
    /// Recognition fails
    FailRecognize(ChannelError),
    /// Recognition never completes until cancelled
    Hang,
}

pub struct ScriptedProvider {
    capability: ProviderCapability,
    steps: Mutex<VecDeque<Step>>,
}

impl ScriptedProvider {
    pub fn scanner(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            capability: ProviderCapability::Scanner,
            steps: Mutex::new(steps.into()),
        })
    }

    pub fn speech(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            capability: ProviderCapability::SpeechRecognizer,
            steps: Mutex::new(steps.into()),
        })
    }
}

#[async_trait]
impl CaptureProvider for ScriptedProvider {
    fn capability(&self) -> ProviderCapability {
        self.capability
    }

    async fn acquire_artifact(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<CaptureArtifact, ChannelError> {
        let acquire_failure = {
            let mut steps = self.steps.lock().unwrap();
            if matches!(steps.front(), Some(Step::FailAcquire(_))) {
                steps.pop_front()
            } else {
                None
            }
        };
        if let Some(Step::FailAcquire(err)) = acquire_failure {
            return Err(err);
        }
        Ok(CaptureArtifact { data: vec![0u8; 4], mime_type: "image/png".to_string() })
    }

    async fn recognize(
        &self,
        _artifact: CaptureArtifact,
        cancel: &CancellationToken,
    ) -> Result<RawCapture, ChannelError> {
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Recognize { text, price_hint }) => Ok(RawCapture { text, price_hint }),
            Some(Step::RecognizeAfterMs { delay_ms, text }) => {
                // Deliberately ignores the cancellation token so tests can
                // observe late completions being discarded
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(RawCapture { text, price_hint: None })
            }
            Some(Step::FailRecognize(err)) => Err(err),
            Some(Step::FailAcquire(err)) => Err(err),
            Some(Step::Hang) | None => {
                cancel.cancelled().await;
                Err(ChannelError::Raw("cancelled".to_string()))
            }
        }
    }
}
