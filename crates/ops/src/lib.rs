#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations for pkgsig
//!
//! This crate sits between the CLI and the verification crates: it
//! checks lists of package files, imports trusted keys from files, stdin
//! and keyservers, and lists the keyring.

mod checksig;
mod context;
mod fetch;
mod keys;
mod types;

pub use checksig::verify_packages;
pub use context::{OpsContextBuilder, OpsCtx};
pub use fetch::{http_url, DefaultFetcher, FetchConfig, SourceFetcher};
pub use keys::{expand_query, key_id_token, KeyImporter};
pub use types::{CheckReport, CheckedItem, ImportReport, KeyInfo, PackageCheck};

use pkgsig_errors::Error;

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Package check results
    CheckReport(CheckReport),
    /// Key import results
    ImportReport(ImportReport),
    /// Trusted keys
    KeyList(Vec<KeyInfo>),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("failed to serialize result: {e}")))
    }

    /// Failed units: packages, or key sources, blocks and certificates
    #[must_use]
    pub fn failures(&self) -> usize {
        match self {
            OperationResult::CheckReport(report) => report.failures(),
            OperationResult::ImportReport(report) => report.failures,
            OperationResult::KeyList(_) => 0,
        }
    }
}

/// Import keys from `sources` into the context's keyring
pub fn import_keys<S: AsRef<str>>(ctx: &mut OpsCtx, sources: &[S]) -> ImportReport {
    let keys = &ctx.config.keys;
    KeyImporter::new(&mut ctx.keyring, ctx.fetcher.as_ref())
        .with_keyserver_query(keys.keyserver_query.clone())
        .with_min_source_bytes(keys.min_source_bytes)
        .import(sources)
}

/// Trusted keys in key id order
#[must_use]
pub fn list_keys(ctx: &OpsCtx) -> Vec<KeyInfo> {
    ctx.keyring
        .trusted_keys()
        .map(|key| KeyInfo {
            key_id: key.key_id,
            user_id: key.user_id.clone(),
            trusted_since: key.trusted_since,
        })
        .collect()
}
