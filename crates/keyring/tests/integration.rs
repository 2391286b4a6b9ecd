//! Integration tests for keyring storage

use ed25519_dalek::SigningKey;
use pkgsig_keyring::{DirKeyring, Keyring, MemoryKeyring, TRUSTED_KEYS_FILE};
use pkgsig_pgp::{write_packet, PacketTag, ParseOptions};
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

#[test]
fn test_memory_keyring_reimport_is_ok() {
    let mut keyring = MemoryKeyring::new();
    let cert = certificate(1, "One <one@example.org>");
    let first = keyring.import_certificate(&cert).unwrap();
    let second = keyring.import_certificate(&cert).unwrap();
    assert_eq!(first, second);
    assert_eq!(keyring.len(), 1);
    assert!(keyring.lookup(first).is_some());
}

#[test]
fn test_dir_keyring_persists_across_open() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("keys");

    let id = {
        let mut keyring = DirKeyring::open(&dir, ParseOptions::default()).unwrap();
        keyring.import_certificate(&certificate(2, "Two")).unwrap();
        keyring.import_certificate(&certificate(3, "Three")).unwrap()
    };
    assert!(dir.join(TRUSTED_KEYS_FILE).exists());

    let keyring = DirKeyring::open(&dir, ParseOptions::default()).unwrap();
    assert_eq!(keyring.len(), 2);
    assert!(keyring.lookup(id).is_some());
    let names: Vec<_> = keyring
        .trusted_keys()
        .filter_map(|k| k.user_id.clone())
        .collect();
    assert!(names.contains(&"Three".to_string()));
}

#[test]
fn test_dir_keyring_reimport_keeps_one_entry() {
    let temp = TempDir::new().unwrap();
    let mut keyring = DirKeyring::open(temp.path(), ParseOptions::default()).unwrap();
    let cert = certificate(4, "Four");
    keyring.import_certificate(&cert).unwrap();
    keyring.import_certificate(&cert).unwrap();
    assert_eq!(keyring.trusted_keys().count(), 1);
}

#[test]
fn test_corrupt_keys_file_is_reported() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join(TRUSTED_KEYS_FILE), "{ not json").unwrap();
    let err = DirKeyring::open(temp.path(), ParseOptions::default()).unwrap_err();
    assert!(err.to_string().contains("storage error"));
    assert!(err.to_string().contains("is damaged"));
}

#[test]
fn test_failed_save_leaves_key_untrusted() {
    let temp = TempDir::new().unwrap();
    let mut keyring = DirKeyring::open(temp.path(), ParseOptions::default()).unwrap();
    let keys_file = temp.path().join(TRUSTED_KEYS_FILE);
    std::fs::create_dir(&keys_file).unwrap();

    let cert = certificate(5, "Five");
    assert!(keyring.import_certificate(&cert).is_err());
    assert!(keyring.is_empty());
    assert_eq!(keyring.trusted_keys().count(), 0);

    std::fs::remove_dir(&keys_file).unwrap();
    let id = keyring.import_certificate(&cert).unwrap();
    assert!(keyring.lookup(id).is_some());
    assert!(keys_file.is_file());

    let reopened = DirKeyring::open(temp.path(), ParseOptions::default()).unwrap();
    assert!(reopened.lookup(id).is_some());
}
