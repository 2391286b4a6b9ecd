//! Digest contexts bound to a sequential stream
//!
//! A `DigestStream` owns the reader and a set of accumulators keyed by id.
//! Every byte read through it is fed to every active accumulator, so a
//! context started before a region is read covers exactly the bytes read
//! after it was started.

use crate::DigestContext;
use pkgsig_errors::{Error, PackageError};
use pkgsig_types::HashAlgorithm;
use std::collections::BTreeMap;
use std::io::{self, Read};
use tracing::trace;

/// Size of chunks used when draining a stream
const CHUNK_SIZE: usize = 4 * 8192;

/// Identifier of a digest context within one stream
pub type ContextId = u32;

/// A forward-only reader that feeds attached digest contexts
#[derive(Debug)]
pub struct DigestStream<R> {
    inner: R,
    name: String,
    contexts: BTreeMap<ContextId, DigestContext>,
    consumed: u64,
}

impl<R: Read> DigestStream<R> {
    /// Wrap a reader; `name` is used in error messages
    pub fn new(inner: R, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
            contexts: BTreeMap::new(),
            consumed: 0,
        }
    }

    /// Descriptive name of the underlying stream
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes read through the stream so far
    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Number of live digest contexts
    #[must_use]
    pub fn active(&self) -> usize {
        self.contexts.len()
    }

    /// Start accumulating under `id` from the next byte read onward
    ///
    /// A context that is already live is left untouched so that it keeps
    /// covering everything read since it was started. Returns whether a new
    /// context was started.
    pub fn init_digest(&mut self, algorithm: HashAlgorithm, id: ContextId) -> bool {
        if self.contexts.contains_key(&id) {
            trace!(stream = %self.name, id, "digest already active");
            return false;
        }
        trace!(stream = %self.name, id, %algorithm, offset = self.consumed, "digest started");
        self.contexts.insert(id, DigestContext::new(algorithm));
        true
    }

    /// Duplicate the live context without disturbing it
    #[must_use]
    pub fn dup_digest(&self, id: ContextId) -> Option<DigestContext> {
        self.contexts.get(&id).cloned()
    }

    /// Detach and finalize the context under `id`
    pub fn fini_digest(&mut self, id: ContextId) -> Option<Vec<u8>> {
        self.contexts.remove(&id).map(DigestContext::finalize)
    }

    /// Finalize every remaining context, returning how many there were
    pub fn fini_all(&mut self) -> usize {
        let contexts = std::mem::take(&mut self.contexts);
        let count = contexts.len();
        for ctx in contexts.into_values() {
            let _ = ctx.finalize();
        }
        count
    }

    /// Read to end of stream, discarding content but feeding contexts
    ///
    /// # Errors
    /// Returns an error if the underlying reader fails.
    pub fn drain(&mut self) -> Result<u64, Error> {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            match self.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => total += n as u64,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    return Err(PackageError::ReadFailed {
                        message: format!("Fread failed: {e}"),
                    }
                    .into())
                }
            }
        }
        Ok(total)
    }

    /// Give back the wrapped reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for DigestStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            for ctx in self.contexts.values_mut() {
                ctx.update(&buf[..n]);
            }
            self.consumed += n as u64;
        }
        Ok(n)
    }
}
