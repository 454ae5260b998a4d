//! The validated product record and the capture-channel tag it carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// The channel a name/price pair entered the system through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureMethod {
    /// Camera label scanner (OCR)
    Scanner,
    /// Speech transcript
    Voice,
    /// Keyboard entry
    Manual,
}

/// A validated (name, price) record, immutable once constructed.
///
/// There is no public constructor: the only way to obtain one is through
/// `ProductValidator::accept`, which runs full validation first. Holding a
/// `CapturedProduct` therefore proves the record passed the business rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedProduct {
    name: String,
    price: Amount,
    source: CaptureMethod,
    captured_at: DateTime<Utc>,
}

impl CapturedProduct {
    /// Crate-internal constructor; reachable only from the validator.
    pub(crate) fn new(name: String, price: Amount, source: CaptureMethod) -> Self {
        Self { name, price, source, captured_at: Utc::now() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Amount {
        self.price
    }

    pub fn source(&self) -> CaptureMethod {
        self.source
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}
