#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for pkgsig
//!
//! Value types shared by the codec, digest, keyring and verification crates:
//! hash algorithm identifiers, key ids, byte ranges, verify flags and
//! per-item outcomes.

pub mod algorithm;
pub mod flags;
pub mod keyid;
pub mod outcome;
pub mod tags;

// Re-export commonly used types
pub use algorithm::HashAlgorithm;
pub use flags::{SigRange, VerifyFlags};
pub use keyid::KeyId;
pub use outcome::Outcome;

use serde::{Deserialize, Serialize};

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Plain,
    /// Structured JSON logging
    Json,
}
