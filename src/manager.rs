//! # Capture Manager Module
//!
//! Owns the capture-provider registry and the device registry, and creates
//! per-attempt [`CaptureSession`]s. Device exclusivity lives here: a camera
//! or microphone is leased to at most one live session, and starting a new
//! capture on a held device cancels the prior session before the new one
//! acquires it.
//!
//! The manager also re-exposes sessionless validation for the manual-entry
//! path, which never goes through a session.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use crate::amount::Amount;
use crate::business_rules::BusinessRules;
use crate::capture_config::CaptureConfig;
use crate::errors::{AppError, AppResult};
use crate::product::CaptureMethod;
use crate::provider::{CaptureProvider, DeviceKind, ProviderCapability};
use crate::session::CaptureSession;
use crate::validator::{ProductValidator, ValidationResult};

/// Tracks which session currently holds each device.
///
/// Leases are identified by session id so that a release arriving after the
/// device was re-leased (the prior session terminating late) cannot evict
/// the new holder.
pub struct DeviceRegistry {
    held: Mutex<HashMap<DeviceKind, (u64, Weak<CaptureSession>)>>,
}

impl DeviceRegistry {
    fn new() -> Arc<Self> {
        Arc::new(Self { held: Mutex::new(HashMap::new()) })
    }

    /// Lease `kind` to `session`, cancelling any live prior holder first.
    fn acquire(self: &Arc<Self>, kind: DeviceKind, session: &Arc<CaptureSession>) -> DeviceLease {
        let prior = {
            let mut held = self.held.lock();
            held.insert(kind, (session.id(), Arc::downgrade(session)))
        };

        // Cancel outside the registry lock: cancelling drops the prior
        // session's lease, which calls back into release()
        if let Some((prior_id, weak)) = prior {
            if prior_id != session.id() {
                if let Some(prev) = weak.upgrade() {
                    debug!(
                        device = ?kind,
                        prior_session = %prior_id,
                        new_session = %session.id(),
                        "Device re-leased, cancelling prior session"
                    );
                    prev.cancel();
                }
            }
        }

        DeviceLease { registry: Arc::clone(self), kind, session_id: session.id() }
    }

    fn release(&self, kind: DeviceKind, session_id: u64) {
        let mut held = self.held.lock();
        if let Some((holder, _)) = held.get(&kind) {
            if *holder == session_id {
                held.remove(&kind);
            }
        }
    }

    /// Session id of the current holder, if any live session holds `kind`.
    pub fn holder(&self, kind: DeviceKind) -> Option<u64> {
        let held = self.held.lock();
        held.get(&kind)
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(id, _)| *id)
    }
}

/// Exclusive hold on a device for the lifetime of one session. Released on
/// drop, which the session triggers on any terminating transition.
pub struct DeviceLease {
    registry: Arc<DeviceRegistry>,
    kind: DeviceKind,
    session_id: u64,
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.registry.release(self.kind, self.session_id);
    }
}

/// Entry point for callers: creates sessions, owns providers and devices,
/// exposes sessionless validation for manual entry.
pub struct CaptureManager {
    providers: HashMap<CaptureMethod, Arc<dyn CaptureProvider>>,
    devices: Arc<DeviceRegistry>,
    validator: Arc<ProductValidator>,
    config: CaptureConfig,
    next_session_id: AtomicU64,
}

impl CaptureManager {
    /// Create a manager over the given rules and timing configuration.
    pub fn new(rules: BusinessRules, config: CaptureConfig) -> AppResult<Self> {
        config.validate()?;
        let validator = Arc::new(ProductValidator::new(rules)?);
        Ok(Self {
            providers: HashMap::new(),
            devices: DeviceRegistry::new(),
            validator,
            config,
            next_session_id: AtomicU64::new(0),
        })
    }

    /// Manager with default rules and timing.
    pub fn with_defaults() -> Self {
        Self::new(BusinessRules::default(), CaptureConfig::default())
            .expect("default configuration is valid")
    }

    /// Register the provider for the method its capability serves,
    /// replacing any previous one.
    pub fn register_provider(&mut self, provider: Arc<dyn CaptureProvider>) {
        let method = match provider.capability() {
            ProviderCapability::Scanner => CaptureMethod::Scanner,
            ProviderCapability::SpeechRecognizer => CaptureMethod::Voice,
        };
        info!(method = ?method, "Capture provider registered");
        self.providers.insert(method, provider);
    }

    /// Create a session in `Idle` without starting it. Acquires the device
    /// lease immediately — a prior session holding the device is cancelled.
    ///
    /// `Manual` has no session support: manual entry validates directly via
    /// [`CaptureManager::validate`].
    pub fn create_session(&self, method: CaptureMethod) -> AppResult<Arc<CaptureSession>> {
        if method == CaptureMethod::Manual {
            return Err(AppError::UnsupportedMethod(method));
        }
        let provider = self
            .providers
            .get(&method)
            .cloned()
            .ok_or(AppError::ProviderMissing(method))?;

        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed) + 1;
        let session = CaptureSession::new(
            id,
            method,
            Arc::clone(&provider),
            Arc::clone(&self.validator),
            self.config.clone(),
        );

        let lease = self.devices.acquire(provider.capability().device(), &session);
        session.attach_lease(lease);
        Ok(session)
    }

    /// Create and immediately start a capture session.
    pub fn start_capture(&self, method: CaptureMethod) -> AppResult<Arc<CaptureSession>> {
        let session = self.create_session(method)?;
        session.start()?;
        Ok(session)
    }

    /// Sessionless validation — the manual-entry path.
    pub fn validate(
        &self,
        name: &str,
        price: Option<Amount>,
        method: CaptureMethod,
    ) -> ValidationResult {
        self.validator.validate(name, price, method)
    }

    pub fn validator(&self) -> &ProductValidator {
        &self.validator
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// The device registry, for callers that surface device-busy state.
    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }
}
