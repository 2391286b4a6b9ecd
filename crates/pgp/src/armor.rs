//! ASCII armor

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pgp::armor::{BlockType, Dearmor};
use pkgsig_errors::{Error, SigningError};
use std::fmt;
use std::io::Read;

/// Text that introduces every armored block
pub const ARMOR_MARKER: &str = "-----BEGIN PGP ";

const ARMOR_END: &str = "-----END PGP ";

/// Type named in the armor header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArmorKind {
    PublicKey,
    Signature,
    Message,
    PrivateKey,
    Other(String),
}

impl ArmorKind {
    fn from_block(typ: Option<&BlockType>) -> Self {
        match typ {
            Some(BlockType::PublicKey) => Self::PublicKey,
            Some(BlockType::Signature) => Self::Signature,
            Some(BlockType::Message) => Self::Message,
            Some(BlockType::PrivateKey) => Self::PrivateKey,
            Some(other) => Self::Other(format!("{other:?}")),
            None => Self::Other(String::new()),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::PublicKey => "PUBLIC KEY BLOCK",
            Self::Signature => "SIGNATURE",
            Self::Message => "MESSAGE",
            Self::PrivateKey => "PRIVATE KEY BLOCK",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for ArmorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A decoded armored block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Armor {
    pub kind: ArmorKind,
    pub data: Vec<u8>,
}

/// Decode the first armored block found in `text`
///
/// Text before the marker is ignored. A CRC24 line, when present, must
/// match the decoded data.
///
/// # Errors
/// Returns `SigningError::InvalidArmor` if no block is found or the block
/// does not decode.
pub fn parse_armored(text: &str) -> Result<Armor, Error> {
    let start = text
        .find(ARMOR_MARKER)
        .ok_or_else(|| SigningError::InvalidArmor("no armor header".to_string()))?;

    let mut dearmor = Dearmor::new(text[start..].as_bytes());
    let mut data = Vec::new();
    dearmor
        .read_to_end(&mut data)
        .map_err(|e| SigningError::InvalidArmor(e.to_string()))?;

    Ok(Armor {
        kind: ArmorKind::from_block(dearmor.typ.as_ref()),
        data,
    })
}

/// Wrap `data` in ASCII armor
///
/// No CRC24 line is written.
#[must_use]
pub fn armor(kind: &ArmorKind, data: &[u8]) -> String {
    let label = kind.label();
    let encoded = STANDARD.encode(data);
    let mut out = format!("{ARMOR_MARKER}{label}-----\n\n");
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(64));
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }
    out.push_str(&format!("{ARMOR_END}{label}-----\n"));
    out
}
