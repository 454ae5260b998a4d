//! # Capture Session Module
//!
//! One `CaptureSession` drives one user-initiated capture attempt through a
//! channel (scanner or voice), from device acquisition to a validated
//! product or a canonical error.
//!
//! ## State Machine
//!
//! ```text
//! IDLE ──start──► ACTIVE ──artifact──► PROCESSING ──recognized+valid──► SUCCESS
//!   ▲                                      │                               │
//!   │                                      ├──recognition/validation───► ERROR
//!   │                                      │         failure               │
//!   │                                      └──deadline exceeded──────────► │
//!   │                                                                      │
//!   └────────────────────retry (counter +1)────────────────────────────────┘
//!
//! cancel: from ACTIVE / PROCESSING / ERROR ──► terminated (no state emitted)
//! fallback: from ERROR ──► terminated, carrying best-effort raw drafts
//! complete: from SUCCESS ──► terminated, emitting the CapturedProduct
//! ```
//!
//! ## Staleness
//!
//! Every attempt carries a generation number. Completions are applied under
//! the state lock only when the generation still matches and the state is
//! still the one the completion belongs to; anything else is discarded.
//! A recognition result that lands after a timeout, cancel or retry can
//! therefore never overwrite newer state — last-writer-wins is not possible
//! here by construction.
//!
//! The processing deadline is measured on `tokio::time::Instant`, the
//! session's monotonic clock, from the moment the artifact is obtained.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::amount::Amount;
use crate::capture_config::CaptureConfig;
use crate::capture_errors::{classify, CaptureError, ChannelError};
use crate::errors::{error_logging, AppError, AppResult};
use crate::manager::DeviceLease;
use crate::observability;
use crate::price_parser::{extract_name_and_price, find_price, NamePriceCandidate};
use crate::product::{CaptureMethod, CapturedProduct};
use crate::provider::{CaptureProvider, RawCapture};
use crate::validator::{ProductValidator, ValidationResult};

/// Presentation-facing session state.
#[derive(Debug, Clone, Serialize)]
pub enum CaptureState {
    /// Created, nothing in flight
    Idle,
    /// Device held, artifact acquisition in progress (user-paced)
    Active,
    /// Recognition and validation in flight, deadline running
    Processing,
    /// A validated product is ready to be taken with `complete`
    Success(CapturedProduct),
    /// The attempt failed; retry, fallback and cancel remain legal
    Error(CaptureError),
}

impl CaptureState {
    /// Stable name used in transition errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Active => "active",
            CaptureState::Processing => "processing",
            CaptureState::Success(_) => "success",
            CaptureState::Error(_) => "error",
        }
    }
}

/// Signal that the user wants to finish this capture manually, carrying
/// whatever raw data the failed attempt managed to gather for pre-filling
/// the manual form. The core does not navigate anywhere itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackIntent {
    pub method: CaptureMethod,
    pub draft_name: Option<String>,
    pub draft_price: Option<Amount>,
}

struct SessionInner {
    state: CaptureState,
    /// Generation of the current attempt; stale completions carry an older value
    attempt: u64,
    retry_count: u32,
    terminated: bool,
    /// Best-effort parse of the last recognition, kept for fallback pre-fill
    draft: Option<NamePriceCandidate>,
    last_validation: Option<ValidationResult>,
    attempt_cancel: Option<CancellationToken>,
    device_lease: Option<DeviceLease>,
}

/// A per-attempt capture state machine. Created by `CaptureManager`,
/// destroyed on completion, cancel or fallback.
pub struct CaptureSession {
    id: u64,
    method: CaptureMethod,
    provider: Arc<dyn CaptureProvider>,
    validator: Arc<ProductValidator>,
    config: CaptureConfig,
    inner: Mutex<SessionInner>,
    state_tx: watch::Sender<CaptureState>,
    cancel_token: CancellationToken,
}

impl CaptureSession {
    pub(crate) fn new(
        id: u64,
        method: CaptureMethod,
        provider: Arc<dyn CaptureProvider>,
        validator: Arc<ProductValidator>,
        config: CaptureConfig,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(CaptureState::Idle);
        Arc::new(Self {
            id,
            method,
            provider,
            validator,
            config,
            inner: Mutex::new(SessionInner {
                state: CaptureState::Idle,
                attempt: 0,
                retry_count: 0,
                terminated: false,
                draft: None,
                last_validation: None,
                attempt_cancel: None,
                device_lease: None,
            }),
            state_tx,
            cancel_token: CancellationToken::new(),
        })
    }

    pub(crate) fn attach_lease(&self, lease: DeviceLease) {
        self.inner.lock().device_lease = Some(lease);
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn method(&self) -> CaptureMethod {
        self.method
    }

    /// Number of retries so far. The core never caps this — attempt-limit
    /// policy belongs to the caller.
    pub fn retry_count(&self) -> u32 {
        self.inner.lock().retry_count
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.lock().terminated
    }

    /// Current state snapshot.
    pub fn state(&self) -> CaptureState {
        self.inner.lock().state.clone()
    }

    /// Validation outcome of the most recent recognition, if any.
    pub fn last_validation(&self) -> Option<ValidationResult> {
        self.inner.lock().last_validation.clone()
    }

    /// Observe state transitions for presentation.
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state_tx.subscribe()
    }

    /// Begin capturing. Legal only from `Idle`.
    pub fn start(self: &Arc<Self>) -> AppResult<()> {
        let (attempt, attempt_cancel) = {
            let mut inner = self.inner.lock();
            if inner.terminated {
                return Err(AppError::IllegalTransition { from: "terminated", event: "start" });
            }
            if !matches!(inner.state, CaptureState::Idle) {
                return Err(AppError::IllegalTransition {
                    from: inner.state.name(),
                    event: "start",
                });
            }
            inner.state = CaptureState::Active;
            inner.attempt += 1;
            let token = self.cancel_token.child_token();
            inner.attempt_cancel = Some(token.clone());
            (inner.attempt, token)
        };
        self.publish(CaptureState::Active);

        info!(session_id = %self.id, method = ?self.method, attempt = %attempt, "Capture started");
        observability::record_capture_started(self.method);

        let session = Arc::clone(self);
        let span = observability::session_span("run_attempt", self.id);
        tokio::spawn(
            async move {
                session.run_attempt(attempt, attempt_cancel).await;
            }
            .instrument(span),
        );
        Ok(())
    }

    /// Retry after an error: back to `Idle`, counter incremented, and a
    /// fresh attempt started. Legal only from `Error`.
    pub fn retry(self: &Arc<Self>) -> AppResult<()> {
        {
            let mut inner = self.inner.lock();
            if inner.terminated {
                return Err(AppError::IllegalTransition { from: "terminated", event: "retry" });
            }
            if !matches!(inner.state, CaptureState::Error(_)) {
                return Err(AppError::IllegalTransition {
                    from: inner.state.name(),
                    event: "retry",
                });
            }
            // The previous error is only held for display; retry clears it
            inner.state = CaptureState::Idle;
            inner.retry_count += 1;
            inner.last_validation = None;
            if let Some(token) = inner.attempt_cancel.take() {
                token.cancel();
            }
        }
        self.publish(CaptureState::Idle);
        debug!(session_id = %self.id, retries = %self.retry_count(), "Retrying capture");
        self.start()
    }

    /// Cancel the session. Safe to call at any point and idempotent; drives
    /// the session to terminated without emitting success or error.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock();
        if inner.terminated {
            return;
        }
        inner.terminated = true;
        if let Some(token) = inner.attempt_cancel.take() {
            token.cancel();
        }
        inner.device_lease = None;
        drop(inner);

        self.cancel_token.cancel();
        info!(session_id = %self.id, "Capture session cancelled");
        observability::record_capture_outcome(self.method, "cancelled");
    }

    /// Signal fallback to manual entry. Legal only from `Error`; terminates
    /// the session and hands back whatever raw data was gathered so the
    /// manual form can be pre-filled.
    pub fn request_fallback(&self) -> AppResult<FallbackIntent> {
        let mut inner = self.inner.lock();
        if inner.terminated {
            return Err(AppError::IllegalTransition { from: "terminated", event: "fallback" });
        }
        if !matches!(inner.state, CaptureState::Error(_)) {
            return Err(AppError::IllegalTransition {
                from: inner.state.name(),
                event: "fallback",
            });
        }

        inner.terminated = true;
        if let Some(token) = inner.attempt_cancel.take() {
            token.cancel();
        }
        inner.device_lease = None;

        let intent = FallbackIntent {
            method: self.method,
            draft_name: inner
                .draft
                .as_ref()
                .map(|d| d.name.clone())
                .filter(|name| !name.is_empty()),
            draft_price: inner.draft.as_ref().and_then(|d| d.price),
        };
        drop(inner);

        self.cancel_token.cancel();
        info!(session_id = %self.id, "Fallback to manual entry requested");
        observability::record_capture_outcome(self.method, "fallback");
        Ok(intent)
    }

    /// Take the captured product after success was displayed; terminates
    /// the session. Legal only from `Success`.
    pub fn complete(&self) -> AppResult<CapturedProduct> {
        let mut inner = self.inner.lock();
        if inner.terminated {
            return Err(AppError::IllegalTransition { from: "terminated", event: "complete" });
        }
        let product = match &inner.state {
            CaptureState::Success(product) => product.clone(),
            other => {
                return Err(AppError::IllegalTransition { from: other.name(), event: "complete" })
            }
        };

        inner.terminated = true;
        inner.device_lease = None;
        drop(inner);

        self.cancel_token.cancel();
        info!(session_id = %self.id, product = %product.name(), "Capture completed");
        Ok(product)
    }

    // ---- attempt execution ----

    async fn run_attempt(self: Arc<Self>, attempt: u64, cancel: CancellationToken) {
        // Active phase: user-paced, no deadline of its own
        let artifact = tokio::select! {
            _ = cancel.cancelled() => return,
            result = self.provider.acquire_artifact(&cancel) => match result {
                Ok(artifact) => artifact,
                Err(err) => {
                    self.apply_channel_error(attempt, &err);
                    return;
                }
            },
        };

        // Artifact obtained: enter processing, deadline starts now
        if !self.apply_processing(attempt) {
            return;
        }
        let deadline = tokio::time::Instant::now() + self.config.processing_timeout();

        let provider = Arc::clone(&self.provider);
        let recognize_cancel = cancel.clone();
        let mut recognition = tokio::spawn(async move {
            provider.recognize(artifact, &recognize_cancel).await
        });

        tokio::select! {
            _ = cancel.cancelled() => {
                recognition.abort();
            }
            _ = tokio::time::sleep_until(deadline) => {
                self.apply_timeout(attempt);
                cancel.cancel();
                // Drain the in-flight recognition; whatever it still returns
                // is stale and must be rejected by the generation guard.
                if let Ok(late) = recognition.await {
                    self.apply_completion(attempt, late);
                }
            }
            joined = &mut recognition => {
                match joined {
                    Ok(result) => self.apply_completion(attempt, result),
                    Err(join_err) => {
                        if !join_err.is_cancelled() {
                            error_logging::log_session_error(
                                &join_err,
                                "recognition_task",
                                self.id,
                                Some(self.retry_count()),
                            );
                            self.apply_channel_error(
                                attempt,
                                &ChannelError::Raw("recognition-failed".to_string()),
                            );
                        }
                    }
                }
            }
        }
    }

    /// Active → Processing, guarded against staleness.
    fn apply_processing(&self, attempt: u64) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.terminated
                || inner.attempt != attempt
                || !matches!(inner.state, CaptureState::Active)
            {
                return false;
            }
            inner.state = CaptureState::Processing;
        }
        self.publish(CaptureState::Processing);
        debug!(session_id = %self.id, attempt = %attempt, "Artifact obtained, processing");
        true
    }

    /// Apply a finished recognition. Parsing and validation run outside the
    /// lock; the transition itself is atomic and rejects stale completions.
    fn apply_completion(&self, attempt: u64, result: Result<RawCapture, ChannelError>) {
        let raw = match result {
            Ok(raw) => raw,
            Err(err) => {
                self.apply_channel_error(attempt, &err);
                return;
            }
        };

        let candidate = Self::candidate_from_raw(&raw);
        let validation = self.validator.validate_candidate(&candidate, self.method);
        let product = if validation.is_valid() {
            self.validator
                .accept(&candidate.name, candidate.price, self.method)
                .ok()
        } else {
            None
        };

        let new_state = {
            let mut inner = self.inner.lock();
            if inner.terminated
                || inner.attempt != attempt
                || !matches!(inner.state, CaptureState::Processing)
            {
                debug!(
                    session_id = %self.id,
                    attempt = %attempt,
                    state = %inner.state.name(),
                    "Discarding stale recognition completion"
                );
                observability::record_stale_completion_discarded();
                return;
            }

            inner.draft = Some(candidate);
            inner.last_validation = Some(validation);
            let state = match product {
                Some(product) => CaptureState::Success(product),
                None => CaptureState::Error(CaptureError::InvalidData),
            };
            inner.state = state.clone();
            state
        };

        match &new_state {
            CaptureState::Success(product) => {
                info!(session_id = %self.id, product = %product.name(), "Recognition validated");
                observability::record_capture_outcome(self.method, "success");
            }
            _ => {
                observability::record_capture_outcome(self.method, "error");
            }
        }
        self.publish(new_state);
    }

    /// Apply a channel failure, classified onto the canonical taxonomy.
    fn apply_channel_error(&self, attempt: u64, err: &ChannelError) {
        let classified = classify(err);
        {
            let mut inner = self.inner.lock();
            if inner.terminated
                || inner.attempt != attempt
                || !matches!(inner.state, CaptureState::Active | CaptureState::Processing)
            {
                observability::record_stale_completion_discarded();
                return;
            }
            inner.state = CaptureState::Error(classified);
        }

        warn!(session_id = %self.id, error = %err, classified = ?classified, "Capture failed");
        observability::record_capture_outcome(self.method, "error");
        self.publish(CaptureState::Error(classified));
    }

    /// Deadline exceeded while processing.
    fn apply_timeout(&self, attempt: u64) {
        {
            let mut inner = self.inner.lock();
            if inner.terminated
                || inner.attempt != attempt
                || !matches!(inner.state, CaptureState::Processing)
            {
                return;
            }
            inner.state = CaptureState::Error(CaptureError::Timeout);
        }

        warn!(
            session_id = %self.id,
            timeout_secs = %self.config.processing_timeout_secs,
            "Recognition deadline exceeded"
        );
        observability::record_capture_outcome(self.method, "timeout");
        self.publish(CaptureState::Error(CaptureError::Timeout));
    }

    /// Parse raw recognized content into a name/price candidate. A price
    /// fragment recognized separately by the channel wins over whatever the
    /// free-text scan finds.
    fn candidate_from_raw(raw: &RawCapture) -> NamePriceCandidate {
        let mut candidate = extract_name_and_price(&raw.text);
        if let Some(hint) = &raw.price_hint {
            if let Some(found) = find_price(hint) {
                candidate.price = Some(found.amount);
                candidate.price_ambiguous = found.ambiguous;
            }
        }
        candidate
    }

    fn publish(&self, state: CaptureState) {
        let _ = self.state_tx.send_replace(state);
    }
}
