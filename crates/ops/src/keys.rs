//! Trusted key import
//!
//! Each source is read fully into memory and scanned for armored public
//! key blocks. Every block may hold several concatenated certificates;
//! each one is imported on its own, so a bad certificate, block or source
//! only counts as a failure and never stops the rest.

use crate::fetch::SourceFetcher;
use crate::types::ImportReport;
use pkgsig_config::constants::MIN_SOURCE_BYTES;
use pkgsig_errors::StorageError;
use pkgsig_keyring::Keyring;
use pkgsig_pgp::{certificates, parse_armored, ArmorKind, ARMOR_MARKER};
use tracing::{debug, error, info};

/// The hex digits of a `0x<keyid>` token
///
/// Only runs of exactly 8 or 16 hex digits count as a key id.
#[must_use]
pub fn key_id_token(token: &str) -> Option<&str> {
    let rest = token.strip_prefix("0x")?;
    let run = rest.bytes().take_while(u8::is_ascii_hexdigit).count();
    matches!(run, 8 | 16).then(|| &rest[..run])
}

/// Expand a keyserver query template for `key_id`
///
/// A `{keyid}` placeholder is substituted; otherwise the id is appended.
#[must_use]
pub fn expand_query(template: &str, key_id: &str) -> String {
    if template.contains("{keyid}") {
        template.replace("{keyid}", key_id)
    } else {
        format!("{template}{key_id}")
    }
}

/// Imports certificates from key sources into a keyring
pub struct KeyImporter<'a> {
    keyring: &'a mut dyn Keyring,
    fetcher: &'a dyn SourceFetcher,
    keyserver_query: Option<String>,
    min_source_bytes: usize,
}

impl<'a> KeyImporter<'a> {
    pub fn new(keyring: &'a mut dyn Keyring, fetcher: &'a dyn SourceFetcher) -> Self {
        Self {
            keyring,
            fetcher,
            keyserver_query: None,
            min_source_bytes: MIN_SOURCE_BYTES,
        }
    }

    #[must_use]
    pub fn with_keyserver_query(mut self, template: Option<String>) -> Self {
        self.keyserver_query = template.filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn with_min_source_bytes(mut self, min: usize) -> Self {
        self.min_source_bytes = min;
        self
    }

    /// Where `source` is read from
    ///
    /// Key id tokens are expanded through the keyserver query when one is
    /// configured; everything else is used as given.
    #[must_use]
    pub fn resolve(&self, source: &str) -> String {
        match (key_id_token(source), &self.keyserver_query) {
            (Some(id), Some(template)) => {
                let url = expand_query(template, id);
                debug!(source, url = %url, "expanded key id");
                url
            }
            _ => source.to_string(),
        }
    }

    /// Import every source in order
    pub fn import<S: AsRef<str>>(&mut self, sources: &[S]) -> ImportReport {
        let mut report = ImportReport::default();
        for source in sources {
            self.import_source(source.as_ref(), &mut report);
        }
        info!(
            sources = report.sources,
            imported = report.imported.len(),
            failures = report.failures,
            "key import finished"
        );
        report
    }

    fn import_source(&mut self, source: &str, report: &mut ImportReport) {
        report.sources += 1;
        let location = self.resolve(source);
        match self.fetcher.fetch(&location) {
            Ok(buf) if buf.len() >= self.min_source_bytes => {
                self.import_buffer(source, &buf, report);
            }
            Ok(buf) => {
                let err = StorageError::SourceTooSmall {
                    source_name: source.to_string(),
                    message: format!("{} bytes", buf.len()),
                };
                error!(source, "{err}");
                report.fail(err.to_string());
            }
            Err(e) => {
                error!(source, error = %e, "{source}: import read failed");
                report.fail(format!("{source}: import read failed: {e}"));
            }
        }
    }

    /// Import all armored public key blocks found in `buf`
    pub fn import_bytes(&mut self, name: &str, buf: &[u8]) -> ImportReport {
        let mut report = ImportReport {
            sources: 1,
            ..ImportReport::default()
        };
        self.import_buffer(name, buf, &mut report);
        report
    }

    fn import_buffer(&mut self, name: &str, buf: &[u8], report: &mut ImportReport) {
        let text = String::from_utf8_lossy(buf);
        let mut blocks = 0usize;
        let mut keyno = 0usize;
        let mut offset = 0;

        while let Some(pos) = text[offset..].find(ARMOR_MARKER) {
            let start = offset + pos;
            offset = start + ARMOR_MARKER.len();
            blocks += 1;

            let armor = match parse_armored(&text[start..]) {
                Ok(armor) if armor.kind == ArmorKind::PublicKey => armor,
                Ok(armor) => {
                    error!(source = name, kind = %armor.kind, "{name}: not an armored public key");
                    report.fail(format!("{name}: block {blocks}: {} block", armor.kind));
                    continue;
                }
                Err(e) => {
                    error!(source = name, error = %e, "{name}: not an armored public key");
                    report.fail(format!("{name}: block {blocks}: {e}"));
                    continue;
                }
            };

            for cert in certificates(&armor.data) {
                keyno += 1;
                match cert {
                    Ok((cert, remaining)) => {
                        debug!(source = name, len = cert.len(), remaining, "certificate {keyno}");
                        match self.keyring.import_certificate(cert) {
                            Ok(id) => {
                                info!(source = name, key_id = %id, "imported key {keyno}");
                                report.imported.push(id);
                            }
                            Err(e) => {
                                error!(
                                    source = name,
                                    block = blocks,
                                    error = %e,
                                    "{name}: key {keyno} import failed"
                                );
                                report.fail(format!("{name}: key {keyno} import failed: {e}"));
                            }
                        }
                    }
                    Err(e) => {
                        error!(source = name, error = %e, "{name}: key {keyno} not a certificate");
                        report.fail(format!("{name}: key {keyno} not a certificate: {e}"));
                    }
                }
            }
        }

        if blocks == 0 {
            error!(source = name, "{name}: not an armored public key");
            report.fail(format!("{name}: not an armored public key"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_token() {
        assert_eq!(key_id_token("0x1234ABCD"), Some("1234ABCD"));
        assert_eq!(key_id_token("0x1234abcd1234abcd"), Some("1234abcd1234abcd"));
        assert_eq!(key_id_token("0x1234ABCD.asc"), Some("1234ABCD"));
        assert_eq!(key_id_token("0xZZZZ"), None);
        assert_eq!(key_id_token("0x123456789"), None);
        assert_eq!(key_id_token("1234ABCD"), None);
    }

    #[test]
    fn test_expand_query() {
        assert_eq!(
            expand_query("hkp://keys.example.org/pks/lookup?op=get&search=0x", "1234ABCD"),
            "hkp://keys.example.org/pks/lookup?op=get&search=0x1234ABCD"
        );
        assert_eq!(
            expand_query("https://example.org/keys/{keyid}.asc", "1234ABCD"),
            "https://example.org/keys/1234ABCD.asc"
        );
    }
}
