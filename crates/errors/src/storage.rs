//! Trusted key store and key source errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("trusted key store {path} is damaged: {message}")]
    CorruptKeyring { path: String, message: String },

    #[error("stored certificate {key_id} is damaged: {message}")]
    CorruptCertificate { key_id: String, message: String },

    #[error("import read failed: {source_name}: {message}")]
    SourceTooSmall { source_name: String, message: String },
}

impl UserFacingError for StorageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::CorruptKeyring { .. } | Self::CorruptCertificate { .. } => {
                Some("Remove the damaged keyring file and import the keys again.")
            }
            Self::SourceTooSmall { .. } => {
                Some("Point the import at an armored public key file or key id.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::CorruptKeyring { .. } => "storage.corrupt_keyring",
            Self::CorruptCertificate { .. } => "storage.corrupt_certificate",
            Self::SourceTooSmall { .. } => "storage.source_too_small",
        };
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damaged_store_has_hint() {
        let err = StorageError::CorruptKeyring {
            path: "/keys/trusted_keys.json".to_string(),
            message: "expected value".to_string(),
        };
        assert_eq!(err.user_code(), Some("storage.corrupt_keyring"));
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("/keys/trusted_keys.json"));
    }
}
