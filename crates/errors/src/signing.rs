//! Signing and key error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SigningError {
    #[error("signature verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("invalid public key format: {0}")]
    InvalidPublicKey(String),

    #[error("not an armored public key: {0}")]
    InvalidArmor(String),

    #[error("malformed OpenPGP packet: {0}")]
    MalformedPacket(String),

    #[error("unsupported {what}: {id}")]
    Unsupported { what: String, id: u8 },
}

impl UserFacingError for SigningError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArmor(_) => {
                Some("Provide an ASCII-armored PGP PUBLIC KEY BLOCK.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::VerificationFailed { .. } => "signing.verification_failed",
            Self::InvalidSignatureFormat(_) => "signing.invalid_signature",
            Self::InvalidPublicKey(_) => "signing.invalid_public_key",
            Self::InvalidArmor(_) => "signing.invalid_armor",
            Self::MalformedPacket(_) => "signing.malformed_packet",
            Self::Unsupported { .. } => "signing.unsupported",
        };
        Some(code)
    }
}
