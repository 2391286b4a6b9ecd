//! The 96-byte package lead

use crate::read_full;
use pkgsig_errors::{Error, PackageError};
use std::io::Read;

pub const LEAD_SIZE: usize = 96;

const LEAD_MAGIC: [u8; 4] = [0xed, 0xab, 0xee, 0xdb];
/// Signature type announcing a header-style signature section
const SIGTYPE_HEADERSIG: u16 = 5;

/// Parsed package lead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub major: u8,
    pub minor: u8,
    pub package_type: u16,
    pub archnum: u16,
    pub name: String,
    pub osnum: u16,
    pub signature_type: u16,
}

impl Lead {
    /// A binary package lead for `name`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            major: 3,
            minor: 0,
            package_type: 0,
            archnum: 1,
            name: name.into(),
            osnum: 1,
            signature_type: SIGTYPE_HEADERSIG,
        }
    }

    /// Read and validate a lead
    ///
    /// # Errors
    /// Returns an error on short reads, bad magic, an unsupported major
    /// version or a signature type other than header-style signatures.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, Error> {
        let mut buf = [0u8; LEAD_SIZE];
        read_full(reader, &mut buf, "lead")?;
        Self::parse(&buf)
    }

    /// Validate a lead from its raw bytes
    ///
    /// # Errors
    /// See [`Lead::read`].
    pub fn parse(buf: &[u8; LEAD_SIZE]) -> Result<Self, Error> {
        if buf[..4] != LEAD_MAGIC {
            return Err(PackageError::NotAPackage.into());
        }

        let be16 = |at: usize| u16::from_be_bytes([buf[at], buf[at + 1]]);
        let name_bytes = &buf[10..76];
        let name_len = name_bytes.iter().position(|&b| b == 0).unwrap_or(66);

        let lead = Self {
            major: buf[4],
            minor: buf[5],
            package_type: be16(6),
            archnum: be16(8),
            name: String::from_utf8_lossy(&name_bytes[..name_len]).into_owned(),
            osnum: be16(76),
            signature_type: be16(78),
        };

        if lead.signature_type != SIGTYPE_HEADERSIG {
            return Err(PackageError::IllegalSignatureType {
                sigtype: lead.signature_type,
            }
            .into());
        }
        if !(3..=4).contains(&lead.major) {
            return Err(PackageError::UnsupportedVersion { major: lead.major }.into());
        }
        Ok(lead)
    }

    /// Serialize to the on-disk layout
    #[must_use]
    pub fn to_bytes(&self) -> [u8; LEAD_SIZE] {
        let mut buf = [0u8; LEAD_SIZE];
        buf[..4].copy_from_slice(&LEAD_MAGIC);
        buf[4] = self.major;
        buf[5] = self.minor;
        buf[6..8].copy_from_slice(&self.package_type.to_be_bytes());
        buf[8..10].copy_from_slice(&self.archnum.to_be_bytes());
        let name = self.name.as_bytes();
        let n = name.len().min(65);
        buf[10..10 + n].copy_from_slice(&name[..n]);
        buf[76..78].copy_from_slice(&self.osnum.to_be_bytes());
        buf[78..80].copy_from_slice(&self.signature_type.to_be_bytes());
        buf
    }
}
