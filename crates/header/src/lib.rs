#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package lead and header codec
//!
//! Reads the fixed-size lead and the tagged header blobs that precede a
//! package payload. Blobs are read from any `Read`, so reading through a
//! digesting stream feeds the header bytes to whatever digests are active.
//! A small builder serializes headers for fixtures and tooling.

mod blob;
mod builder;
mod header;
mod lead;

pub use blob::{HeaderBlob, MAX_HEADER_DATA, MAX_SIGNATURE_DATA};
pub use builder::HeaderBuilder;
pub use header::{Header, HeaderEntry, TagData, TagType};
pub use lead::{Lead, LEAD_SIZE};

use pkgsig_errors::{Error, PackageError};
use std::io::{self, Read};

/// Fill `buf` completely or report what went wrong
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<(), Error> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            PackageError::ShortRead {
                message: format!("{what}: expected {} bytes", buf.len()),
            }
            .into()
        } else {
            Error::from(PackageError::ReadFailed {
                message: format!("{what}: {e}"),
            })
        }
    })
}
