//! Per-item cryptographic checks

use crate::manifest::{Expected, SignatureItem};
use pkgsig_errors::{Error, SigningError};
use pkgsig_hash::DigestContext;
use pkgsig_keyring::Keyring;
use pkgsig_pgp::SignaturePacket;
use pkgsig_types::Outcome;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Outcome of one check plus its message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub outcome: Outcome,
    pub message: String,
}

impl Verdict {
    fn new(item: &SignatureItem, outcome: Outcome, detail: Option<String>) -> Self {
        let message = match detail {
            Some(detail) => format!("{}: {} ({detail})", item.description(), outcome.as_str()),
            None => format!("{}: {}", item.description(), outcome.as_str()),
        };
        Self { outcome, message }
    }
}

/// Checks one item against a snapshot of its digest
pub trait SignatureVerifier {
    /// `digest` is a duplicate of the item's live context; the verifier
    /// owns it and finalizes it.
    fn verify(&self, keyring: &dyn Keyring, item: &SignatureItem, digest: DigestContext) -> Verdict;
}

/// Digest comparison plus RSA/Ed25519 signature checks
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVerifier {
    now: Option<u64>,
}

impl DefaultVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate key expiry at a fixed time (seconds since the epoch)
    #[must_use]
    pub fn at(now: u64) -> Self {
        Self { now: Some(now) }
    }

    fn now(&self) -> u64 {
        self.now.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs())
        })
    }

    fn verify_signature(
        &self,
        keyring: &dyn Keyring,
        item: &SignatureItem,
        sig: &SignaturePacket,
        mut digest: DigestContext,
    ) -> Verdict {
        let Some(key) = sig.issuer.and_then(|id| keyring.lookup(id)) else {
            return Verdict::new(item, Outcome::NoKey, None);
        };
        if key.is_expired(self.now()) {
            return Verdict::new(item, Outcome::NotTrusted, Some("key expired".to_string()));
        }

        digest.update(sig.trailer());
        let hash = digest.finalize();
        if hash.get(..2) != Some(&sig.hash_prefix[..]) {
            return Verdict::new(item, Outcome::Fail, Some("digest prefix mismatch".to_string()));
        }

        match key.verify(sig, &hash) {
            Ok(()) => Verdict::new(item, Outcome::Ok, None),
            Err(Error::Signing(SigningError::Unsupported { what, id })) => {
                Verdict::new(item, Outcome::Unsupported, Some(format!("{what} {id}")))
            }
            Err(e) => {
                debug!(item = %item, error = %e, "signature check failed");
                Verdict::new(item, Outcome::Fail, None)
            }
        }
    }
}

impl SignatureVerifier for DefaultVerifier {
    fn verify(
        &self,
        keyring: &dyn Keyring,
        item: &SignatureItem,
        digest: DigestContext,
    ) -> Verdict {
        match &item.expected {
            Expected::Digest(expected) => {
                let actual = digest.finalize();
                if &actual == expected {
                    Verdict::new(item, Outcome::Ok, None)
                } else {
                    Verdict::new(
                        item,
                        Outcome::Fail,
                        Some(format!(
                            "Expected {} != {}",
                            hex::encode(expected),
                            hex::encode(actual)
                        )),
                    )
                }
            }
            Expected::Signature(sig) => self.verify_signature(keyring, item, sig, digest),
            Expected::None => Verdict::new(item, Outcome::Unsupported, None),
        }
    }
}
