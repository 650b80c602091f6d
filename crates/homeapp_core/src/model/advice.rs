//! Daily advice value object. Never persisted.

use serde::{Deserialize, Serialize};

/// One piece of advice text, replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub text: String,
}

impl Advice {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
