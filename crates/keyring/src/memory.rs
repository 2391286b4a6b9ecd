//! In-memory keyring

use crate::Keyring;
use pkgsig_errors::Error;
use pkgsig_pgp::{Certificate, ParseOptions, PublicKey};
use pkgsig_types::KeyId;
use std::collections::BTreeMap;
use tracing::debug;

/// Keyring that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyring {
    certs: BTreeMap<KeyId, Certificate>,
    options: ParseOptions,
}

impl MemoryKeyring {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            certs: BTreeMap::new(),
            options,
        }
    }

    /// Certificates ordered by primary key id
    pub fn certificates(&self) -> impl Iterator<Item = &Certificate> {
        self.certs.values()
    }

    #[must_use]
    pub fn get(&self, id: KeyId) -> Option<&Certificate> {
        self.certs.get(&id)
    }

    /// Insert an already parsed certificate
    ///
    /// Returns `false` if a certificate with the same primary key was
    /// already present; the stored copy is kept.
    pub fn insert(&mut self, cert: Certificate) -> bool {
        let id = cert.key_id();
        if self.certs.contains_key(&id) {
            debug!(key_id = %id, "certificate already in keyring");
            return false;
        }
        self.certs.insert(id, cert);
        true
    }

    pub(crate) fn parse(&self, data: &[u8]) -> Result<Certificate, Error> {
        Certificate::parse(data, self.options)
    }
}

impl Keyring for MemoryKeyring {
    fn import_certificate(&mut self, data: &[u8]) -> Result<KeyId, Error> {
        let cert = self.parse(data)?;
        let id = cert.key_id();
        self.insert(cert);
        Ok(id)
    }

    fn lookup(&self, id: KeyId) -> Option<&PublicKey> {
        self.certs.values().find_map(|cert| cert.find_key(id))
    }

    fn len(&self) -> usize {
        self.certs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_rejected() {
        let mut keyring = MemoryKeyring::new();
        assert!(keyring.import_certificate(&[0xc6, 0x01, 0x04]).is_err());
        assert!(keyring.is_empty());
    }
}
