//! Per-item verification outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of checking one digest or signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Fail,
    NoKey,
    NotTrusted,
    Unsupported,
}

impl Outcome {
    #[must_use]
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// The word used at the end of a verification message
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Fail => "BAD",
            Self::NoKey => "NOKEY",
            Self::NotTrusted => "NOTTRUSTED",
            Self::Unsupported => "UNSUPPORTED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
