//! Shared result types for pool filters

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Outcome of one filter for one pool
///
/// A failing verdict always carries a message. Verdicts are built fresh
/// for every evaluation and never shared between pools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    ok: bool,
    message: Option<String>,
    data: Option<Value>,
}

impl Verdict {
    /// Passing verdict with no diagnostics
    pub fn pass() -> Self {
        Self {
            ok: true,
            message: None,
            data: None,
        }
    }

    /// Failing verdict with a human-readable reason
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Attach machine-usable diagnostics
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.ok { "PASS" } else { "FAIL" };
        match &self.message {
            Some(message) => write!(f, "{} ({})", status, message),
            None => write!(f, "{}", status),
        }
    }
}
