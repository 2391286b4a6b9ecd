#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Streaming package verification
//!
//! A package is read once, front to back. Digests declared in the
//! signature header are bound to the header, the payload, or both, and are
//! checked as soon as the bytes they cover have passed through the stream.
//! Every enabled check is evaluated and handed to a [`Reporter`]; a failing
//! check never stops the others.

mod manifest;
mod package;
mod report;
mod tracker;
mod verifier;

pub use manifest::{Expected, ItemKind, Items, Manifest, SignatureItem};
pub use package::{Aborted, ItemResult, PackageVerifier, Phase, VerificationReport};
pub use report::{Reporter, TerseReporter, VerboseReporter};
pub use tracker::RangeTracker;
pub use verifier::{DefaultVerifier, SignatureVerifier, Verdict};
