//! Digest contexts bound to byte ranges of one sequential stream

use crate::manifest::SignatureItem;
use pkgsig_errors::Error;
use pkgsig_hash::{ContextId, DigestContext, DigestStream};
use pkgsig_header::{HeaderBlob, Lead};
use pkgsig_types::{tags, SigRange, VerifyFlags};
use std::io::Read;
use tracing::debug;

/// Owns the package stream and the digests running over it
///
/// The stream is read once, front to back. Contexts activated before a
/// region is consumed see every byte of it; a context for a combined range
/// stays live across both the header and the payload. Remaining contexts
/// are finalized when the tracker is dropped.
pub struct RangeTracker<R: Read> {
    stream: DigestStream<R>,
}

impl<R: Read> RangeTracker<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            stream: DigestStream::new(reader, name),
        }
    }

    /// Description of the underlying stream
    #[must_use]
    pub fn name(&self) -> &str {
        self.stream.name()
    }

    /// Bytes consumed so far
    #[must_use]
    pub fn position(&self) -> u64 {
        self.stream.consumed()
    }

    /// Number of live digest contexts
    #[must_use]
    pub fn active(&self) -> usize {
        self.stream.active()
    }

    /// Start digests for enabled items that cover `range`
    ///
    /// For `SigRange::PAYLOAD` only payload-only items are started; items
    /// spanning header and payload were started with the header. Returns
    /// the number of contexts started.
    pub fn activate<'i, I>(&mut self, items: I, range: SigRange, flags: VerifyFlags) -> usize
    where
        I: IntoIterator<Item = &'i SignatureItem>,
    {
        let mut started = 0;
        for item in items {
            if item.is_disabled(flags) || item.parse_error().is_some() {
                continue;
            }
            if !item.range.intersects(range) {
                continue;
            }
            if range == SigRange::PAYLOAD && item.range.contains(SigRange::HEADER) {
                continue;
            }
            let Some(algorithm) = item.algorithm else {
                continue;
            };
            if self.stream.init_digest(algorithm, item.context_id) {
                started += 1;
            }
        }
        debug!(stream = %self.stream.name(), ?range, started, "digests activated");
        started
    }

    /// Read the lead
    ///
    /// # Errors
    /// Propagates lead codec errors.
    pub fn read_lead(&mut self) -> Result<Lead, Error> {
        Lead::read(&mut self.stream)
    }

    /// Read the signature header blob
    ///
    /// # Errors
    /// Propagates header codec errors.
    pub fn read_signature_header(&mut self) -> Result<HeaderBlob, Error> {
        HeaderBlob::read(&mut self.stream, tags::HEADER_SIGNATURES)
    }

    /// Consume the header region, feeding active contexts
    ///
    /// # Errors
    /// Propagates header codec errors.
    pub fn consume_header(&mut self) -> Result<HeaderBlob, Error> {
        HeaderBlob::read(&mut self.stream, tags::HEADER_IMMUTABLE)
    }

    /// Consume the payload to end of stream, feeding active contexts
    ///
    /// # Errors
    /// Returns an error if the stream fails before end of file.
    pub fn consume_payload(&mut self) -> Result<u64, Error> {
        self.stream.drain()
    }

    /// Duplicate a live context without disturbing it
    #[must_use]
    pub fn snapshot(&self, id: ContextId) -> Option<DigestContext> {
        self.stream.dup_digest(id)
    }

    /// Finalize and remove a context
    pub fn finalize(&mut self, id: ContextId) -> Option<Vec<u8>> {
        self.stream.fini_digest(id)
    }
}

impl<R: Read> Drop for RangeTracker<R> {
    fn drop(&mut self) {
        let remaining = self.stream.fini_all();
        if remaining > 0 {
            debug!(stream = %self.stream.name(), remaining, "finalized leftover digests");
        }
    }
}
