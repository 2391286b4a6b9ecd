//! Package verification driver

use crate::manifest::{ItemKind, Manifest, SignatureItem};
use crate::report::Reporter;
use crate::tracker::RangeTracker;
use crate::verifier::{DefaultVerifier, SignatureVerifier};
use pkgsig_errors::Error;
use pkgsig_header::Header;
use pkgsig_keyring::Keyring;
use pkgsig_pgp::ParseOptions;
use pkgsig_types::{tags, Outcome, SigRange, VerifyFlags};
use std::fmt;
use std::io::Read;
use tracing::{debug, error};

/// Tags fished out of the main header into the signature manifest
const COPY_TAGS: [u32; 2] = [tags::PAYLOADDIGEST, tags::PAYLOADDIGESTALGO];

/// Progress of one verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    LeadRead,
    SigHeaderRead,
    HeaderDigestsActive,
    HeaderRead,
    HeaderVerified,
    PayloadDigestsActive,
    PayloadRead,
    PayloadVerified,
    CombinedVerified,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::LeadRead => "lead read",
            Self::SigHeaderRead => "signature header read",
            Self::HeaderDigestsActive => "header digests active",
            Self::HeaderRead => "header read",
            Self::HeaderVerified => "header verified",
            Self::PayloadDigestsActive => "payload digests active",
            Self::PayloadRead => "payload read",
            Self::PayloadVerified => "payload verified",
            Self::CombinedVerified => "combined verified",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// A verification stopped by a read or format error
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stream}: {source}")]
pub struct Aborted {
    /// Last phase completed before the error
    pub phase: Phase,
    pub stream: String,
    pub source: Error,
}

/// Result of one evaluated item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub tag: u32,
    pub kind: ItemKind,
    pub range: SigRange,
    pub outcome: Outcome,
    pub message: String,
}

/// Aggregate result of verifying one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub stream: String,
    /// `Ok` iff every evaluated item passed
    pub outcome: Outcome,
    /// Evaluated items, in evaluation order
    pub items: Vec<ItemResult>,
    pub last_failure: Option<String>,
    pub phase: Phase,
}

impl VerificationReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Number of items that did not pass
    #[must_use]
    pub fn failures(&self) -> usize {
        self.items.iter().filter(|i| !i.outcome.is_ok()).count()
    }

    /// The last failure message prefixed with the stream name
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        self.last_failure
            .as_ref()
            .map(|message| format!("{}: {message}", self.stream))
    }
}

/// Verifies packages against a keyring
pub struct PackageVerifier<'a> {
    keyring: &'a dyn Keyring,
    verifier: Box<dyn SignatureVerifier + 'a>,
    flags: VerifyFlags,
    options: ParseOptions,
}

impl<'a> PackageVerifier<'a> {
    #[must_use]
    pub fn new(keyring: &'a dyn Keyring) -> Self {
        Self {
            keyring,
            verifier: Box::new(DefaultVerifier::new()),
            flags: VerifyFlags::empty(),
            options: ParseOptions::default(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: VerifyFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_verifier(mut self, verifier: impl SignatureVerifier + 'a) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    /// Verify the package read from `reader`
    ///
    /// Every enabled item is evaluated and reported, even after failures.
    ///
    /// # Errors
    /// Returns [`Aborted`] if the lead or a header cannot be read or
    /// decoded, or the stream fails while reading the payload. Items
    /// evaluated before the error have already been reported.
    pub fn verify<R: Read>(
        &self,
        reader: R,
        name: &str,
        reporter: &mut dyn Reporter,
    ) -> Result<VerificationReport, Aborted> {
        let mut run = Run {
            tracker: RangeTracker::new(reader, name),
            phase: Phase::Start,
            items: Vec::new(),
            last_failure: None,
        };
        let result = self.drive(&mut run, reporter);
        let Run {
            phase,
            items,
            last_failure,
            ..
        } = run;

        match result {
            Ok(()) => {
                let outcome = if items.iter().all(|i| i.outcome.is_ok()) {
                    Outcome::Ok
                } else {
                    Outcome::Fail
                };
                let report = VerificationReport {
                    stream: name.to_string(),
                    outcome,
                    items,
                    last_failure,
                    phase,
                };
                if let Some(summary) = report.summary() {
                    error!("{summary}");
                }
                Ok(report)
            }
            Err(source) => {
                let aborted = Aborted {
                    phase,
                    stream: name.to_string(),
                    source,
                };
                error!(phase = %phase, "{aborted}");
                Err(aborted)
            }
        }
    }

    fn drive<R: Read>(&self, run: &mut Run<R>, reporter: &mut dyn Reporter) -> Result<(), Error> {
        run.tracker.read_lead()?;
        run.advance(Phase::LeadRead);

        let mut sigh = run.tracker.read_signature_header()?.import()?;
        run.advance(Phase::SigHeaderRead);

        let items: Vec<SignatureItem> = Manifest::new(&sigh, self.options).items().collect();
        run.tracker.activate(&items, SigRange::HEADER, self.flags);
        run.advance(Phase::HeaderDigestsActive);

        let blob = run.tracker.consume_header()?;
        run.advance(Phase::HeaderRead);

        self.verify_items(run, &sigh, SigRange::HEADER, reporter);
        run.advance(Phase::HeaderVerified);

        let header = blob.import()?;
        let copied = sigh.copy_tags(&header, &COPY_TAGS);
        debug!(copied, "tags copied from main header");

        let items: Vec<SignatureItem> = Manifest::new(&sigh, self.options).items().collect();
        run.tracker.activate(&items, SigRange::PAYLOAD, self.flags);
        run.advance(Phase::PayloadDigestsActive);

        let payload = run.tracker.consume_payload()?;
        debug!(bytes = payload, "payload consumed");
        run.advance(Phase::PayloadRead);

        self.verify_items(run, &sigh, SigRange::PAYLOAD, reporter);
        run.advance(Phase::PayloadVerified);

        self.verify_items(run, &sigh, SigRange::COMBINED, reporter);
        run.advance(Phase::CombinedVerified);

        run.advance(Phase::Done);
        Ok(())
    }

    /// Evaluate every enabled item whose range is exactly `range`
    fn verify_items<R: Read>(
        &self,
        run: &mut Run<R>,
        sigh: &Header,
        range: SigRange,
        reporter: &mut dyn Reporter,
    ) {
        for item in Manifest::new(sigh, self.options).items() {
            if item.is_disabled(self.flags) || item.range != range {
                continue;
            }

            let (outcome, message) = if let Some(parse_error) = item.parse_error() {
                (Outcome::Fail, parse_error.to_string())
            } else if let Some(digest) = run.tracker.snapshot(item.context_id) {
                let verdict = self.verifier.verify(self.keyring, &item, digest);
                run.tracker.finalize(item.context_id);
                (verdict.outcome, verdict.message)
            } else {
                (
                    Outcome::Fail,
                    format!("{}: digest was not started", item.description()),
                )
            };

            let outcome = reporter.report(&item, outcome, &message);
            if !outcome.is_ok() {
                run.last_failure = Some(message.clone());
            }
            run.items.push(ItemResult {
                tag: item.tag,
                kind: item.kind,
                range: item.range,
                outcome,
                message,
            });
        }
    }
}

struct Run<R: Read> {
    tracker: RangeTracker<R>,
    phase: Phase,
    items: Vec<ItemResult>,
    last_failure: Option<String>,
}

impl<R: Read> Run<R> {
    fn advance(&mut self, phase: Phase) {
        debug!(stream = %self.tracker.name(), from = %self.phase, to = %phase, "phase");
        self.phase = phase;
    }
}
