mod test_helpers;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use carrinho_core::amount::Amount;
    use carrinho_core::business_rules::BusinessRules;
    use carrinho_core::capture_config::CaptureConfig;
    use carrinho_core::capture_errors::{CaptureError, ChannelError, ScannerError, SpeechError};
    use carrinho_core::errors::AppError;
    use carrinho_core::manager::CaptureManager;
    use carrinho_core::product::CaptureMethod;
    use carrinho_core::provider::DeviceKind;
    use carrinho_core::session::CaptureState;

    use crate::test_helpers::{ScriptedProvider, Step};

    fn manager_with(provider: std::sync::Arc<ScriptedProvider>, timeout_secs: u64) -> CaptureManager {
        let mut config = CaptureConfig::default();
        config.processing_timeout_secs = timeout_secs;
        let mut manager =
            CaptureManager::new(BusinessRules::default(), config).expect("config is valid");
        manager.register_provider(provider);
        manager
    }

    #[tokio::test]
    async fn test_scanner_capture_success_flow() {
        let provider = ScriptedProvider::scanner(vec![Step::Recognize {
            text: "Leite Mimosa 1,29".to_string(),
            price_hint: None,
        }]);
        let manager = manager_with(provider, 15);

        let session = manager.start_capture(CaptureMethod::Scanner).expect("session starts");
        let mut states = session.subscribe();
        states
            .wait_for(|state| matches!(state, CaptureState::Success(_)))
            .await
            .expect("session reaches success");

        let product = session.complete().expect("success state yields the product");
        assert_eq!(product.name(), "Leite Mimosa");
        assert_eq!(product.price(), Amount::from_cents(129));
        assert_eq!(product.source(), CaptureMethod::Scanner);
        assert!(session.is_terminated());
    }

    #[tokio::test]
    async fn test_scanner_price_hint_wins_over_text() {
        let provider = ScriptedProvider::scanner(vec![Step::Recognize {
            text: "Leite Mimosa".to_string(),
            price_hint: Some("2,15 €".to_string()),
        }]);
        let manager = manager_with(provider, 15);

        let session = manager.start_capture(CaptureMethod::Scanner).expect("session starts");
        let mut states = session.subscribe();
        states
            .wait_for(|state| matches!(state, CaptureState::Success(_)))
            .await
            .expect("session reaches success");

        let product = session.complete().expect("product is ready");
        assert_eq!(product.price(), Amount::from_cents(215));
    }

    #[tokio::test]
    async fn test_voice_capture_spelled_out_price() {
        let provider = ScriptedProvider::speech(vec![Step::Recognize {
            text: "Comprei leite mimosa por dois euros e vinte e nove cêntimos".to_string(),
            price_hint: None,
        }]);
        let manager = manager_with(provider, 15);

        let session = manager.start_capture(CaptureMethod::Voice).expect("session starts");
        let mut states = session.subscribe();
        states
            .wait_for(|state| matches!(state, CaptureState::Success(_)))
            .await
            .expect("session reaches success");

        let product = session.complete().expect("product is ready");
        assert_eq!(product.name(), "Leite Mimosa");
        assert_eq!(product.price(), Amount::from_cents(229));
        assert_eq!(product.source(), CaptureMethod::Voice);
    }

    #[tokio::test]
    async fn test_channel_failure_is_classified() {
        let provider = ScriptedProvider::speech(vec![Step::FailRecognize(ChannelError::Speech(
            SpeechError::RecordingTooShort,
        ))]);
        let manager = manager_with(provider, 15);

        let session = manager.start_capture(CaptureMethod::Voice).expect("session starts");
        let mut states = session.subscribe();
        let state = states
            .wait_for(|state| matches!(state, CaptureState::Error(_)))
            .await
            .expect("session reaches error");
        assert!(matches!(*state, CaptureState::Error(CaptureError::RecognitionFailed)));
    }

    #[tokio::test]
    async fn test_acquire_failure_errors_from_active() {
        let provider = ScriptedProvider::scanner(vec![Step::FailAcquire(ChannelError::Scanner(
            ScannerError::CameraUnavailable,
        ))]);
        let manager = manager_with(provider, 15);

        let session = manager.start_capture(CaptureMethod::Scanner).expect("session starts");
        let mut states = session.subscribe();
        let state = states
            .wait_for(|state| matches!(state, CaptureState::Error(_)))
            .await
            .expect("session reaches error");
        assert!(matches!(*state, CaptureState::Error(CaptureError::DeviceUnavailable)));
    }

    #[tokio::test]
    async fn test_unvalidatable_recognition_is_invalid_data() {
        // Label text with a name but no readable price
        let provider = ScriptedProvider::scanner(vec![Step::Recognize {
            text: "Leite Mimosa".to_string(),
            price_hint: None,
        }]);
        let manager = manager_with(provider, 15);

        let session = manager.start_capture(CaptureMethod::Scanner).expect("session starts");
        let mut states = session.subscribe();
        let state = states
            .wait_for(|state| matches!(state, CaptureState::Error(_)))
            .await
            .expect("session reaches error");
        assert!(matches!(*state, CaptureState::Error(CaptureError::InvalidData)));

        let validation = session.last_validation().expect("validation ran");
        assert!(!validation.is_valid());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_retry_and_stale_discard() {
        // First attempt: recognition outlives the 1s deadline and its late
        // result must be discarded. Second attempt parks in processing.
        let provider = ScriptedProvider::scanner(vec![
            Step::RecognizeAfterMs { delay_ms: 5_000, text: "Leite 1,29".to_string() },
            Step::Hang,
        ]);
        let manager = manager_with(provider, 1);

        let session = manager.start_capture(CaptureMethod::Scanner).expect("session starts");
        let mut states = session.subscribe();
        states
            .wait_for(|state| matches!(state, CaptureState::Error(CaptureError::Timeout)))
            .await
            .expect("deadline fires");

        // Let the late recognition surface; the generation guard must
        // discard it rather than overwrite the timeout
        tokio::time::sleep(Duration::from_millis(6_000)).await;
        assert!(
            matches!(session.state(), CaptureState::Error(CaptureError::Timeout)),
            "late recognition overwrote the timeout error"
        );

        // Retry: back through idle into a fresh attempt, counter +1
        assert_eq!(session.retry_count(), 0);
        session.retry().expect("retry is legal from error");
        assert_eq!(session.retry_count(), 1);

        states
            .wait_for(|state| matches!(state, CaptureState::Processing))
            .await
            .expect("second attempt reaches processing");

        session.cancel();
        assert!(session.is_terminated());
    }

    #[tokio::test]
    async fn test_from_idle_only_start_is_legal() {
        let provider = ScriptedProvider::scanner(vec![Step::Hang]);
        let manager = manager_with(provider, 15);

        let session = manager.create_session(CaptureMethod::Scanner).expect("session created");
        assert!(matches!(session.state(), CaptureState::Idle));

        assert!(matches!(session.retry(), Err(AppError::IllegalTransition { .. })));
        assert!(matches!(session.complete(), Err(AppError::IllegalTransition { .. })));
        assert!(matches!(session.request_fallback(), Err(AppError::IllegalTransition { .. })));

        session.start().expect("start is legal from idle");
        assert!(session.start().is_err());
        session.cancel();
    }

    #[tokio::test]
    async fn test_processing_rejects_everything_but_cancel() {
        let provider = ScriptedProvider::scanner(vec![Step::Hang]);
        let manager = manager_with(provider, 600);

        let session = manager.start_capture(CaptureMethod::Scanner).expect("session starts");
        let mut states = session.subscribe();
        states
            .wait_for(|state| matches!(state, CaptureState::Processing))
            .await
            .expect("session reaches processing");

        assert!(matches!(session.start(), Err(AppError::IllegalTransition { .. })));
        assert!(matches!(session.retry(), Err(AppError::IllegalTransition { .. })));
        assert!(matches!(session.complete(), Err(AppError::IllegalTransition { .. })));
        assert!(matches!(session.request_fallback(), Err(AppError::IllegalTransition { .. })));

        session.cancel();
        assert!(session.is_terminated());
        // Cancellation emits neither success nor error
        assert!(matches!(session.state(), CaptureState::Processing));
    }

    #[tokio::test]
    async fn test_success_admits_no_further_transitions() {
        let provider = ScriptedProvider::scanner(vec![Step::Recognize {
            text: "Arroz Agulha 1,05".to_string(),
            price_hint: None,
        }]);
        let manager = manager_with(provider, 15);

        let session = manager.start_capture(CaptureMethod::Scanner).expect("session starts");
        let mut states = session.subscribe();
        states
            .wait_for(|state| matches!(state, CaptureState::Success(_)))
            .await
            .expect("session reaches success");

        let _ = session.complete().expect("first complete succeeds");
        assert!(session.complete().is_err());
        assert!(session.start().is_err());
        assert!(session.retry().is_err());
        assert!(session.request_fallback().is_err());
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let provider = ScriptedProvider::scanner(vec![Step::Hang]);
        let manager = manager_with(provider, 15);

        let session = manager.start_capture(CaptureMethod::Scanner).expect("session starts");
        session.cancel();
        session.cancel();
        assert!(session.is_terminated());
        assert!(session.start().is_err());
    }

    #[tokio::test]
    async fn test_fallback_carries_best_effort_drafts() {
        // Price present but far out of bounds: validation fails, yet the
        // raw name and price must survive for manual pre-fill
        let provider = ScriptedProvider::scanner(vec![Step::Recognize {
            text: "Vinho do Porto 12000".to_string(),
            price_hint: None,
        }]);
        let manager = manager_with(provider, 15);

        let session = manager.start_capture(CaptureMethod::Scanner).expect("session starts");
        let mut states = session.subscribe();
        states
            .wait_for(|state| matches!(state, CaptureState::Error(CaptureError::InvalidData)))
            .await
            .expect("validation fails");

        let intent = session.request_fallback().expect("fallback is legal from error");
        assert_eq!(intent.method, CaptureMethod::Scanner);
        assert_eq!(intent.draft_name.as_deref(), Some("Vinho do Porto"));
        assert_eq!(intent.draft_price, Some(Amount::from_cents(1_200_000)));
        assert!(session.is_terminated());
    }

    #[tokio::test]
    async fn test_retry_is_not_capped_by_the_core() {
        let failures = (0..6)
            .map(|_| Step::FailRecognize(ChannelError::Scanner(ScannerError::RecognitionFailed)))
            .collect();
        let provider = ScriptedProvider::scanner(failures);
        let manager = manager_with(provider, 15);

        let session = manager.start_capture(CaptureMethod::Scanner).expect("session starts");
        let mut states = session.subscribe();
        for retry in 0..5u32 {
            states
                .wait_for(|state| matches!(state, CaptureState::Error(_)))
                .await
                .expect("attempt fails");
            assert_eq!(session.retry_count(), retry);
            session.retry().expect("retry is legal from error");
        }
        assert_eq!(session.retry_count(), 5);
        session.cancel();
    }

    #[tokio::test]
    async fn test_device_exclusivity_cancels_prior_session() {
        let provider = ScriptedProvider::scanner(vec![Step::Hang, Step::Hang]);
        let manager = manager_with(provider, 15);

        let first = manager.start_capture(CaptureMethod::Scanner).expect("first session");
        let second = manager.start_capture(CaptureMethod::Scanner).expect("second session");

        assert!(first.is_terminated(), "prior camera holder must be cancelled");
        assert!(!second.is_terminated());
        assert_eq!(manager.devices().holder(DeviceKind::Camera), Some(second.id()));
        second.cancel();
    }

    #[tokio::test]
    async fn test_manual_entry_is_sessionless() {
        let provider = ScriptedProvider::scanner(vec![]);
        let manager = manager_with(provider, 15);

        assert!(matches!(
            manager.start_capture(CaptureMethod::Manual),
            Err(AppError::UnsupportedMethod(CaptureMethod::Manual))
        ));

        // The direct validation path serves manual entry instead
        let result = manager.validate("", Some(Amount::from_cents(129)), CaptureMethod::Manual);
        assert!(!result.is_valid());
        let result =
            manager.validate("Leite Mimosa", Some(Amount::from_cents(129)), CaptureMethod::Manual);
        assert!(result.is_valid());
    }

    #[tokio::test]
    async fn test_missing_provider_is_reported() {
        let manager = CaptureManager::with_defaults();
        assert!(matches!(
            manager.start_capture(CaptureMethod::Voice),
            Err(AppError::ProviderMissing(CaptureMethod::Voice))
        ));
    }
}
