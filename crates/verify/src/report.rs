//! Result reporters

use crate::manifest::SignatureItem;
use pkgsig_types::Outcome;
use std::io::Write;
use tracing::{info, warn};

/// Receives every evaluated item
///
/// The returned outcome is the one used for aggregation.
pub trait Reporter {
    fn report(&mut self, item: &SignatureItem, outcome: Outcome, message: &str) -> Outcome;
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, item: &SignatureItem, outcome: Outcome, message: &str) -> Outcome {
        (**self).report(item, outcome, message)
    }
}

/// One token per item: lowercase when it passed, uppercase when it did
/// not, in parentheses when the key was missing
#[derive(Debug)]
pub struct TerseReporter<W: Write> {
    out: W,
}

impl<W: Write> TerseReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for TerseReporter<W> {
    fn report(&mut self, item: &SignatureItem, outcome: Outcome, message: &str) -> Outcome {
        let token = item.token(!outcome.is_ok());
        let written = if outcome == Outcome::NoKey {
            write!(self.out, "({token}) ")
        } else {
            write!(self.out, "{token} ")
        };
        if let Err(e) = written {
            warn!(error = %e, "failed to write report");
        }
        info!(tag = item.tag, outcome = outcome.as_str(), "{message}");
        outcome
    }
}

/// One indented line per item carrying the full message
#[derive(Debug)]
pub struct VerboseReporter<W: Write> {
    out: W,
}

impl<W: Write> VerboseReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for VerboseReporter<W> {
    fn report(&mut self, item: &SignatureItem, outcome: Outcome, message: &str) -> Outcome {
        if let Err(e) = writeln!(self.out, "    {message}") {
            warn!(error = %e, "failed to write report");
        }
        info!(tag = item.tag, outcome = outcome.as_str(), "{message}");
        outcome
    }
}
