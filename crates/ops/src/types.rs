//! Report types returned by operations

use pkgsig_types::{KeyId, Outcome};
use serde::Serialize;

/// Result of a key import run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Sources attempted
    pub sources: usize,
    /// Primary key ids of the certificates imported, in order
    pub imported: Vec<KeyId>,
    /// Failed sources, blocks and certificates
    pub failures: usize,
    /// One message per failure; keys are numbered across the whole source
    pub errors: Vec<String>,
}

impl ImportReport {
    pub(crate) fn fail(&mut self, message: String) {
        self.failures += 1;
        self.errors.push(message);
    }
}

/// One evaluated digest or signature
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckedItem {
    pub tag: u32,
    pub outcome: Outcome,
    pub message: String,
}

/// Verification result for one package file
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackageCheck {
    pub path: String,
    pub ok: bool,
    pub items: Vec<CheckedItem>,
    /// Set when the package could not be opened or read
    pub error: Option<String>,
}

/// Result of checking a list of packages
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub packages: Vec<PackageCheck>,
}

impl CheckReport {
    /// Number of packages that did not verify
    #[must_use]
    pub fn failures(&self) -> usize {
        self.packages.iter().filter(|p| !p.ok).count()
    }
}

/// A trusted key as listed to the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub key_id: KeyId,
    pub user_id: Option<String>,
    pub trusted_since: i64,
}
