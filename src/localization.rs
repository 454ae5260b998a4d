//! Localization for user-facing capture messages. The locale is fixed to
//! Portuguese; every key also has a built-in fallback label so presentation
//! never renders a bare key when the bundle is missing an entry.

use anyhow::Result;
use fluent_bundle::{FluentBundle, FluentResource};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use unic_langid::LanguageIdentifier;

const LOCALE: &str = "pt";

/// Localization manager for the capture core
pub struct LocalizationManager {
    bundle: FluentBundle<FluentResource>,
}

impl LocalizationManager {
    /// Create a new localization manager with the Portuguese bundle
    pub fn new() -> Result<Self> {
        let locale: LanguageIdentifier = LOCALE.parse()?;
        let mut bundle = FluentBundle::new(vec![locale]);

        // Resource path relative to Cargo.toml
        let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
        let resource_path = format!("{}/locales/{}/main.ftl", manifest_dir, LOCALE);
        if let Ok(content) = fs::read_to_string(&resource_path) {
            if let Ok(resource) = FluentResource::try_new(content) {
                let _ = bundle.add_resource(resource);
            }
        }

        Ok(Self { bundle })
    }

    /// Resolve a message key, or `None` when the bundle has no entry
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, String>>) -> Option<String> {
        let msg = self.bundle.get_message(key)?;
        let pattern = msg.value()?;

        let mut value = String::new();
        if let Some(args) = args {
            let fluent_args = fluent_bundle::FluentArgs::from_iter(
                args.iter()
                    .map(|(k, v)| (*k, fluent_bundle::FluentValue::from(v.as_str()))),
            );
            let _ = self
                .bundle
                .write_pattern(&mut value, pattern, Some(&fluent_args), &mut vec![]);
        } else {
            let _ = self
                .bundle
                .write_pattern(&mut value, pattern, None, &mut vec![]);
        }
        Some(value)
    }
}

thread_local! {
    static LOCALIZATION_MANAGER: RefCell<Option<LocalizationManager>> = const { RefCell::new(None) };
}

/// Initialize the thread-local localization manager
pub fn init_localization() -> Result<()> {
    LOCALIZATION_MANAGER.with(|cell| {
        let mut manager = cell.borrow_mut();
        if manager.is_none() {
            *manager = Some(LocalizationManager::new()?);
        }
        Ok(())
    })
}

/// Resolve `key` to localized text, falling back to `fallback` when the
/// manager is uninitialized or the bundle has no entry.
pub fn t_or(key: &str, fallback: &str) -> String {
    LOCALIZATION_MANAGER.with(|cell| {
        let manager = cell.borrow();
        manager
            .as_ref()
            .and_then(|m| m.get_message(key, None))
            .unwrap_or_else(|| fallback.to_string())
    })
}

/// Resolve `key` with arguments, with the same fallback behavior as [`t_or`].
pub fn t_args_or(key: &str, args: &[(&str, String)], fallback: &str) -> String {
    LOCALIZATION_MANAGER.with(|cell| {
        let manager = cell.borrow();
        let args_map: HashMap<&str, String> = args.iter().cloned().collect();
        manager
            .as_ref()
            .and_then(|m| m.get_message(key, Some(&args_map)))
            .unwrap_or_else(|| fallback.to_string())
    })
}
