#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Trusted key storage
//!
//! A keyring holds the certificates that package signatures are checked
//! against. The key import engine writes to it and the signature verifier
//! reads from it; neither guards against concurrent access.

mod dir;
mod memory;

pub use dir::{DirKeyring, TrustedKey, TRUSTED_KEYS_FILE};
pub use memory::MemoryKeyring;

use pkgsig_errors::Error;
use pkgsig_pgp::PublicKey;
use pkgsig_types::KeyId;

/// Store of trusted certificates
pub trait Keyring {
    /// Import one certificate, returning its primary key id
    ///
    /// Importing a certificate that is already present succeeds.
    ///
    /// # Errors
    /// Returns an error if the certificate does not parse or cannot be
    /// stored.
    fn import_certificate(&mut self, data: &[u8]) -> Result<KeyId, Error>;

    /// Find a primary key or subkey by id
    fn lookup(&self, id: KeyId) -> Option<&PublicKey>;

    /// Number of certificates held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Keyring + ?Sized> Keyring for &mut K {
    fn import_certificate(&mut self, data: &[u8]) -> Result<KeyId, Error> {
        (**self).import_certificate(data)
    }

    fn lookup(&self, id: KeyId) -> Option<&PublicKey> {
        (**self).lookup(id)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
