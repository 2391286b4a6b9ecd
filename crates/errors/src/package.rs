//! Package format error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PackageError {
    #[error("not an rpm package")]
    NotAPackage,

    #[error("unsupported RPM package version: {major}")]
    UnsupportedVersion { major: u8 },

    #[error("illegal signature type: {sigtype}")]
    IllegalSignatureType { sigtype: u16 },

    #[error("header magic mismatch in {region}")]
    BadHeaderMagic { region: String },

    #[error("invalid header: {message}")]
    InvalidHeader { message: String },

    #[error("header tag {tag}: {message}")]
    InvalidTag { tag: u32, message: String },

    #[error("short read: {message}")]
    ShortRead { message: String },

    #[error("read failed: {message}")]
    ReadFailed { message: String },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotAPackage | Self::UnsupportedVersion { .. } => {
                Some("Check that the file is a binary or source RPM package.")
            }
            Self::ShortRead { .. } | Self::ReadFailed { .. } => {
                Some("The package may be truncated; download it again.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ReadFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotAPackage => "package.not_a_package",
            Self::UnsupportedVersion { .. } => "package.unsupported_version",
            Self::IllegalSignatureType { .. } => "package.illegal_signature_type",
            Self::BadHeaderMagic { .. } => "package.bad_header_magic",
            Self::InvalidHeader { .. } => "package.invalid_header",
            Self::InvalidTag { .. } => "package.invalid_tag",
            Self::ShortRead { .. } => "package.short_read",
            Self::ReadFailed { .. } => "package.read_failed",
        };
        Some(code)
    }
}
