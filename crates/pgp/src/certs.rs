//! Walking concatenated certificates

use crate::packet::certificate_length;
use pkgsig_errors::{Error, SigningError};

/// Lazy sequence of `(certificate, remaining)` pairs over a packet buffer
///
/// `remaining` is the number of bytes left after the yielded certificate.
/// The sequence ends at the end of the buffer or after the first
/// length failure, which is yielded as an error.
pub struct Certificates<'a, F> {
    data: &'a [u8],
    measure: F,
    failed: bool,
}

impl<'a, F> Certificates<'a, F>
where
    F: FnMut(&[u8]) -> Result<usize, Error>,
{
    pub fn with_measure(data: &'a [u8], measure: F) -> Self {
        Self {
            data,
            measure,
            failed: false,
        }
    }
}

/// Certificates in `data`, split with [`certificate_length`]
pub fn certificates(data: &[u8]) -> Certificates<'_, fn(&[u8]) -> Result<usize, Error>> {
    Certificates::with_measure(
        data,
        certificate_length as fn(&[u8]) -> Result<usize, Error>,
    )
}

impl<'a, F> Iterator for Certificates<'a, F>
where
    F: FnMut(&[u8]) -> Result<usize, Error>,
{
    type Item = Result<(&'a [u8], usize), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.data.is_empty() {
            return None;
        }
        match (self.measure)(self.data) {
            Ok(len) if len > 0 && len <= self.data.len() => {
                let (cert, rest) = self.data.split_at(len);
                self.data = rest;
                Some(Ok((cert, rest.len())))
            }
            Ok(len) => {
                self.failed = true;
                Some(Err(SigningError::MalformedPacket(format!(
                    "certificate length {len} out of range ({} available)",
                    self.data.len()
                ))
                .into()))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
