//! End-to-end key import

mod common;

use common::{armored, TestKey};
use httpmock::prelude::*;
use pkgsig_config::Config;
use pkgsig_keyring::{DirKeyring, Keyring};
use pkgsig_ops::{import_keys, list_keys, OpsContextBuilder, OpsCtx};
use pkgsig_pgp::{write_packet, PacketTag, ParseOptions};
use tempfile::TempDir;

fn context(temp: &TempDir, keyserver_query: Option<String>) -> OpsCtx {
    let mut config = Config::default();
    config.keys.keyring_dir = Some(temp.path().join("keys"));
    config.keys.keyserver_query = keyserver_query;
    OpsContextBuilder::new()
        .with_config(config)
        .build()
        .unwrap()
}

#[test]
fn test_partial_failure_across_blocks() {
    let temp = TempDir::new().unwrap();
    let mut truncated = Vec::new();
    write_packet(PacketTag::PublicKey, &[4, 0x5f, 0, 0, 0, 1, 0x04, 0x00], &mut truncated);

    let text = format!(
        "{}\n{}\n",
        armored(&[
            TestKey::ed25519(1).certificate("One"),
            TestKey::ed25519(2).certificate("Two")
        ]),
        armored(&[truncated, TestKey::ed25519(4).certificate("Four")]),
    );
    let file = temp.path().join("keys.asc");
    std::fs::write(&file, text).unwrap();

    let mut ctx = context(&temp, None);
    let report = import_keys(&mut ctx, &[file.display().to_string()]);
    assert_eq!(report.failures, 1);
    assert_eq!(report.imported.len(), 3);
    assert_eq!(list_keys(&ctx).len(), 3);
}

#[test]
fn test_reimport_is_stored_once() {
    let temp = TempDir::new().unwrap();
    let key = TestKey::ed25519(9);
    let file = temp.path().join("nine.asc");
    std::fs::write(&file, armored(&[key.certificate("Nine")])).unwrap();
    let source = file.display().to_string();

    {
        let mut ctx = context(&temp, None);
        assert_eq!(import_keys(&mut ctx, &[source.clone()]).failures, 0);
        assert_eq!(import_keys(&mut ctx, &[source]).failures, 0);
    }

    let keyring = DirKeyring::open(temp.path().join("keys"), ParseOptions::default()).unwrap();
    assert_eq!(keyring.len(), 1);
    assert!(keyring.lookup(key.key_id()).is_some());
}

#[test]
fn test_key_id_sources_resolve_through_keyserver() {
    let temp = TempDir::new().unwrap();
    let key = TestKey::ed25519(12);
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pks/lookup")
            .query_param("search", "0x1234ABCD");
        then.status(200).body(armored(&[key.certificate("Twelve")]));
    });

    let mut ctx = context(&temp, Some(server.url("/pks/lookup?op=get&search=0x")));
    let report = import_keys(&mut ctx, &["0x1234ABCD", "0xZZZZ"]);

    mock.assert();
    // 0xZZZZ is not a key id and no such file exists
    assert_eq!(report.failures, 1);
    assert_eq!(report.imported, vec![key.key_id()]);
}

#[test]
fn test_wrong_checksum_rejected() {
    let temp = TempDir::new().unwrap();
    let text = armored(&[TestKey::ed25519(13).certificate("Thirteen")]);
    let file = temp.path().join("bad.asc");
    std::fs::write(&file, text.replace("-----END PGP ", "=AAAA\n-----END PGP ")).unwrap();

    let mut ctx = context(&temp, None);
    let report = import_keys(&mut ctx, &[file.display().to_string()]);
    assert_eq!(report.failures, 1);
    assert!(list_keys(&ctx).is_empty());
}
