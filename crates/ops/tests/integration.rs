//! Integration tests for ops

use ed25519_dalek::SigningKey;
use httpmock::prelude::*;
use pkgsig_config::Config;
use pkgsig_errors::{Error, NetworkError};
use pkgsig_keyring::{Keyring, MemoryKeyring};
use pkgsig_ops::{
    import_keys, list_keys, verify_packages, DefaultFetcher, FetchConfig, KeyImporter,
    OperationResult, OpsContextBuilder, OpsCtx, SourceFetcher,
};
use pkgsig_pgp::{armor, write_packet, ArmorKind, PacketTag};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tempfile::TempDir;

fn certificate(seed: u8, user_id: &str) -> Vec<u8> {
    let key = SigningKey::from_bytes(&[seed; 32]);
    let mut body = vec![4, 0x60, 0, 0, 0, 22, 9];
    body.extend_from_slice(&[0x2b, 0x06, 0x01, 0x04, 0x01, 0xda, 0x47, 0x0f, 0x01]);
    body.extend_from_slice(&[0x01, 0x07, 0x40]);
    body.extend_from_slice(key.verifying_key().as_bytes());

    let mut packets = Vec::new();
    write_packet(PacketTag::PublicKey, &body, &mut packets);
    write_packet(PacketTag::UserId, user_id.as_bytes(), &mut packets);
    packets
}

/// A public key packet whose key material is cut short
fn truncated_certificate() -> Vec<u8> {
    let mut packets = Vec::new();
    write_packet(PacketTag::PublicKey, &[4, 0x60, 0, 0, 0, 22], &mut packets);
    packets
}

fn armored(certs: &[Vec<u8>]) -> String {
    armor(&ArmorKind::PublicKey, &certs.concat())
}

/// Serves sources from memory and records every request
#[derive(Clone, Default)]
struct MapFetcher {
    sources: HashMap<String, Vec<u8>>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl MapFetcher {
    fn with(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.sources.insert(name.to_string(), data.into());
        self
    }
}

impl SourceFetcher for MapFetcher {
    fn fetch(&self, source: &str) -> Result<Vec<u8>, Error> {
        self.requests.borrow_mut().push(source.to_string());
        self.sources
            .get(source)
            .cloned()
            .ok_or_else(|| NetworkError::HttpError {
                status: 404,
                message: "not found".to_string(),
            }
            .into())
    }
}

fn context(temp: &TempDir, fetcher: MapFetcher) -> OpsCtx {
    let mut config = Config::default();
    config.keys.keyring_dir = Some(temp.path().join("keys"));
    OpsContextBuilder::new()
        .with_config(config)
        .with_fetcher(fetcher)
        .build()
        .unwrap()
}

#[test]
fn test_partial_failure_is_isolated_per_certificate() {
    let text = format!(
        "first block\n{}\nsecond block\n{}",
        armored(&[certificate(1, "One"), certificate(2, "Two")]),
        armored(&[truncated_certificate(), certificate(4, "Four")]),
    );
    let mut keyring = MemoryKeyring::new();
    let fetcher = MapFetcher::default();
    let report = KeyImporter::new(&mut keyring, &fetcher).import_bytes("keys.asc", text.as_bytes());

    assert_eq!(report.failures, 1);
    assert_eq!(report.imported.len(), 3);
    assert_eq!(keyring.len(), 3);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("keys.asc: key 3 "));
}

#[test]
fn test_buffer_without_public_key_block() {
    let fetcher = MapFetcher::default();
    let mut keyring = MemoryKeyring::new();
    let mut importer = KeyImporter::new(&mut keyring, &fetcher);

    let plain = importer.import_bytes("notes.txt", &[b'x'; 200]);
    assert_eq!(plain.failures, 1);

    let signature = armor(&ArmorKind::Signature, &[1, 2, 3, 4]);
    let report = importer.import_bytes("sig.asc", signature.as_bytes());
    assert_eq!(report.failures, 1);
    assert!(report.imported.is_empty());
}

#[test]
fn test_wrong_checksum_is_rejected() {
    let text = armored(&[certificate(5, "Five")]);
    let bad = text.replace("-----END PGP ", "=AAAA\n-----END PGP ");

    let fetcher = MapFetcher::default();
    let mut keyring = MemoryKeyring::new();
    let report = KeyImporter::new(&mut keyring, &fetcher).import_bytes("bad.asc", bad.as_bytes());
    assert_eq!(report.failures, 1);
    assert!(keyring.is_empty());
}

#[test]
fn test_small_and_missing_sources() {
    let fetcher = MapFetcher::default().with("tiny.asc", b"-----BEGIN PGP ".to_vec());
    let mut keyring = MemoryKeyring::new();
    let report = KeyImporter::new(&mut keyring, &fetcher).import(&["tiny.asc", "missing.asc"]);
    assert_eq!(report.sources, 2);
    assert_eq!(report.failures, 2);
}

#[test]
fn test_key_id_sources_use_keyserver_query() {
    let key = armored(&[certificate(6, "Six")]);
    let fetcher = MapFetcher::default()
        .with("https://keys.example.org/lookup?search=0x1234ABCD", key.clone())
        .with("0xZZZZ", key);
    let mut keyring = MemoryKeyring::new();
    let report = KeyImporter::new(&mut keyring, &fetcher)
        .with_keyserver_query(Some(
            "https://keys.example.org/lookup?search=0x".to_string(),
        ))
        .import(&["0x1234ABCD", "0xZZZZ"]);

    assert_eq!(report.failures, 0);
    assert_eq!(
        *fetcher.requests.borrow(),
        vec![
            "https://keys.example.org/lookup?search=0x1234ABCD".to_string(),
            "0xZZZZ".to_string()
        ]
    );
}

#[test]
fn test_key_id_without_query_is_literal() {
    let fetcher = MapFetcher::default();
    let mut keyring = MemoryKeyring::new();
    let report = KeyImporter::new(&mut keyring, &fetcher).import(&["0x1234ABCD12345678"]);
    assert_eq!(report.failures, 1);
    assert_eq!(*fetcher.requests.borrow(), vec!["0x1234ABCD12345678".to_string()]);
}

#[test]
fn test_import_into_context_keyring() {
    let temp = TempDir::new().unwrap();
    let key = armored(&[certificate(7, "Seven <seven@example.org>")]);
    let mut ctx = context(&temp, MapFetcher::default().with("seven.asc", key));

    let report = import_keys(&mut ctx, &["seven.asc", "seven.asc"]);
    assert_eq!(report.failures, 0);
    assert_eq!(report.imported.len(), 2);

    let keys = list_keys(&ctx);
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].user_id.as_deref(), Some("Seven <seven@example.org>"));

    let json = OperationResult::KeyList(keys).to_json().unwrap();
    assert!(json.contains("\"type\": \"KeyList\""));
}

#[test]
fn test_verify_packages_counts_unopenable_files() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, MapFetcher::default());
    let junk = temp.path().join("junk.rpm");
    std::fs::write(&junk, [0u8; 200]).unwrap();

    let mut out = Vec::new();
    let report = verify_packages(&ctx, &[temp.path().join("absent.rpm"), junk.clone()], &mut out)
        .unwrap();

    assert_eq!(report.failures(), 2);
    assert!(report.packages[0].error.is_some());
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, format!("{}: NOT OK\n", junk.display()));
    assert_eq!(OperationResult::CheckReport(report).failures(), 2);
}

#[test]
fn test_keyserver_fetch_over_http() {
    let server = MockServer::start();
    let key = armored(&[certificate(8, "Eight")]);
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pks/lookup")
            .query_param("op", "get")
            .query_param("search", "0x89ABCDEF");
        then.status(200).body(key.clone());
    });

    let fetcher = DefaultFetcher::new(&FetchConfig::default()).unwrap();
    let mut keyring = MemoryKeyring::new();
    let report = KeyImporter::new(&mut keyring, &fetcher)
        .with_keyserver_query(Some(server.url("/pks/lookup?op=get&search=0x{keyid}")))
        .import(&["0x89ABCDEF"]);

    mock.assert();
    assert_eq!(report.failures, 0);
    assert_eq!(keyring.len(), 1);
}

#[test]
fn test_keyserver_http_error_counts_one_failure() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/missing.asc");
        then.status(404);
    });

    let fetcher = DefaultFetcher::new(&FetchConfig::default()).unwrap();
    let mut keyring = MemoryKeyring::new();
    let report = KeyImporter::new(&mut keyring, &fetcher).import(&[server.url("/missing.asc")]);

    mock.assert();
    assert_eq!(report.failures, 1);
}
