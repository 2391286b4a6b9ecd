//! Keyring persisted in a directory

use crate::memory::MemoryKeyring;
use crate::Keyring;
use base64::{engine::general_purpose, Engine as _};
use pkgsig_errors::{Error, StorageError};
use pkgsig_pgp::{Certificate, ParseOptions, PublicKey};
use pkgsig_types::KeyId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File holding the trusted keys inside the keyring directory
pub const TRUSTED_KEYS_FILE: &str = "trusted_keys.json";

/// A trusted certificate with metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustedKey {
    pub key_id: KeyId,
    /// The certificate packets (base64)
    pub certificate: String,
    pub user_id: Option<String>,
    /// Timestamp when the key was first trusted
    pub trusted_since: i64,
}

/// Keyring backed by `trusted_keys.json` in a directory
///
/// The file is loaded on open and rewritten after every import that adds
/// a certificate. A certificate is only trusted once the file is written.
#[derive(Debug)]
pub struct DirKeyring {
    dir: PathBuf,
    keys: BTreeMap<KeyId, TrustedKey>,
    memory: MemoryKeyring,
}

impl DirKeyring {
    /// Open the keyring in `dir`, creating the directory if needed
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, or the keys
    /// file cannot be read or holds an unparsable certificate.
    pub fn open(dir: impl AsRef<Path>, options: ParseOptions) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| Error::io_with_path(&e, &dir))?;

        let mut keyring = Self {
            dir,
            keys: BTreeMap::new(),
            memory: MemoryKeyring::with_options(options),
        };
        keyring.load()?;
        Ok(keyring)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn keys_file(&self) -> PathBuf {
        self.dir.join(TRUSTED_KEYS_FILE)
    }

    fn load(&mut self) -> Result<(), Error> {
        let keys_file = self.keys_file();
        if !keys_file.exists() {
            return Ok(());
        }

        let content =
            fs::read_to_string(&keys_file).map_err(|e| Error::io_with_path(&e, &keys_file))?;
        let keys: BTreeMap<KeyId, TrustedKey> =
            serde_json::from_str(&content).map_err(|e| StorageError::CorruptKeyring {
                path: keys_file.display().to_string(),
                message: e.to_string(),
            })?;

        for (id, key) in &keys {
            let raw = general_purpose::STANDARD
                .decode(&key.certificate)
                .map_err(|e| StorageError::CorruptCertificate {
                    key_id: id.to_string(),
                    message: e.to_string(),
                })?;
            let cert = self.memory.parse(&raw)?;
            self.memory.insert(cert);
        }
        debug!(path = %keys_file.display(), keys = keys.len(), "trusted keys loaded");
        self.keys = keys;
        Ok(())
    }

    fn save(&self, keys: &BTreeMap<KeyId, TrustedKey>) -> Result<(), Error> {
        let keys_file = self.keys_file();
        let content = serde_json::to_string_pretty(keys)?;
        fs::write(&keys_file, content).map_err(|e| Error::io_with_path(&e, &keys_file))?;
        Ok(())
    }

    /// Trusted keys ordered by key id
    pub fn trusted_keys(&self) -> impl Iterator<Item = &TrustedKey> {
        self.keys.values()
    }

    #[must_use]
    pub fn certificate(&self, id: KeyId) -> Option<&Certificate> {
        self.memory.get(id)
    }
}

impl Keyring for DirKeyring {
    fn import_certificate(&mut self, data: &[u8]) -> Result<KeyId, Error> {
        let cert = self.memory.parse(data)?;
        let id = cert.key_id();
        if self.keys.contains_key(&id) {
            debug!(key_id = %id, "key already trusted");
            return Ok(id);
        }

        let trusted = TrustedKey {
            key_id: id,
            certificate: general_purpose::STANDARD.encode(cert.as_bytes()),
            user_id: cert.user_id().map(str::to_string),
            trusted_since: chrono::Utc::now().timestamp(),
        };
        let mut staged = self.keys.clone();
        staged.insert(id, trusted);
        self.save(&staged)?;
        self.keys = staged;
        self.memory.insert(cert);
        info!(key_id = %id, "key imported");
        Ok(id)
    }

    fn lookup(&self, id: KeyId) -> Option<&PublicKey> {
        self.memory.lookup(id)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}
