//! Checking package files

use crate::context::OpsCtx;
use crate::types::{CheckReport, CheckedItem, PackageCheck};
use pkgsig_errors::Error;
use pkgsig_verify::{PackageVerifier, Reporter, TerseReporter, VerboseReporter};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tracing::{error, info};

/// Verify each package in turn, writing the human readable lines to `out`
///
/// Terse output is `path: <tokens> OK` or `... NOT OK`; verbose output is
/// `path:` followed by one indented line per item. A package that cannot
/// be opened is a failure and writes nothing.
///
/// # Errors
///
/// Returns an error only if writing to `out` fails.
pub fn verify_packages<P: AsRef<Path>>(
    ctx: &OpsCtx,
    paths: &[P],
    out: &mut dyn Write,
) -> Result<CheckReport, Error> {
    let verifier = PackageVerifier::new(&ctx.keyring)
        .with_flags(ctx.config.verify_flags())
        .with_options(ctx.parse_options());
    let verbose = ctx.config.output.verbose;

    let mut report = CheckReport::default();
    for path in paths {
        let path = path.as_ref();
        let name = path.display().to_string();

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                let err = Error::io_with_path(&e, path);
                error!(package = %name, "open of {name} failed: {e}");
                report.packages.push(PackageCheck {
                    path: name,
                    ok: false,
                    items: Vec::new(),
                    error: Some(err.to_string()),
                });
                continue;
            }
        };

        let result = if verbose {
            writeln!(out, "{name}:")?;
            let mut reporter = VerboseReporter::new(&mut *out);
            verifier.verify(BufReader::new(file), &name, &mut reporter as &mut dyn Reporter)
        } else {
            write!(out, "{name}: ")?;
            let mut reporter = TerseReporter::new(&mut *out);
            verifier.verify(BufReader::new(file), &name, &mut reporter as &mut dyn Reporter)
        };

        let check = match result {
            Ok(verified) => PackageCheck {
                path: name,
                ok: verified.is_ok(),
                items: verified
                    .items
                    .into_iter()
                    .map(|item| CheckedItem {
                        tag: item.tag,
                        outcome: item.outcome,
                        message: item.message,
                    })
                    .collect(),
                error: None,
            },
            Err(aborted) => PackageCheck {
                path: name,
                ok: false,
                items: Vec::new(),
                error: Some(aborted.to_string()),
            },
        };

        if !verbose {
            writeln!(out, "{}", if check.ok { "OK" } else { "NOT OK" })?;
        }
        report.packages.push(check);
    }

    info!(
        packages = report.packages.len(),
        failures = report.failures(),
        "package check finished"
    );
    Ok(report)
}
