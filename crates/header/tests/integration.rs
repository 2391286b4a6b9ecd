//! Integration tests for the header codec

use pkgsig_header::{Header, HeaderBlob, HeaderBuilder, Lead, TagData};
use pkgsig_types::tags;
use proptest::prelude::*;
use std::io::Cursor;

fn sample_header() -> Vec<u8> {
    HeaderBuilder::new()
        .with(tags::SHA256HEADER, TagData::String("00".repeat(32)))
        .with(tags::SIG_MD5, TagData::Bin(vec![0; 16]))
        .build_signature()
}

#[test]
fn test_lead_then_signature_header() {
    let mut bytes = Lead::new("pkg-1.0-1").to_bytes().to_vec();
    bytes.extend(sample_header());
    let mut reader = Cursor::new(bytes);

    let lead = Lead::read(&mut reader).unwrap();
    assert_eq!(lead.name, "pkg-1.0-1");
    let header = HeaderBlob::read(&mut reader, tags::HEADER_SIGNATURES)
        .unwrap()
        .import()
        .unwrap();
    assert_eq!(header.len(), 2);
}

#[test]
fn test_bad_magic_rejected() {
    let mut bytes = sample_header();
    bytes[0] = 0;
    let err = HeaderBlob::read(&mut Cursor::new(bytes), tags::HEADER_SIGNATURES).unwrap_err();
    assert!(err.to_string().contains("magic"));
}

#[test]
fn test_truncated_header_is_short_read() {
    let bytes = sample_header();
    let truncated = &bytes[..bytes.len() - 20];
    let err =
        HeaderBlob::read(&mut Cursor::new(truncated), tags::HEADER_SIGNATURES).unwrap_err();
    assert!(err.to_string().contains("short read"));
}

#[test]
fn test_out_of_bounds_offset_rejected_on_import() {
    let mut bytes = HeaderBuilder::new()
        .with(1000, TagData::Int32(vec![1]))
        .build(None);
    // Point the only entry past the end of the data store
    bytes[16 + 8..16 + 12].copy_from_slice(&64i32.to_be_bytes());
    let blob = HeaderBlob::read(&mut Cursor::new(bytes), tags::HEADER_IMMUTABLE).unwrap();
    assert!(blob.import().is_err());
}

#[test]
fn test_copy_tags_only_fills_missing() {
    let sig = HeaderBuilder::new()
        .with(tags::SHA1HEADER, TagData::String("a".into()))
        .build_signature();
    let main = HeaderBuilder::new()
        .with(tags::PAYLOADDIGEST, TagData::StringArray(vec!["ff".into()]))
        .with(tags::SHA1HEADER, TagData::String("b".into()))
        .build_immutable();

    let mut sigh: Header = HeaderBlob::read(&mut Cursor::new(sig), tags::HEADER_SIGNATURES)
        .unwrap()
        .import()
        .unwrap();
    let h = HeaderBlob::read(&mut Cursor::new(main), tags::HEADER_IMMUTABLE)
        .unwrap()
        .import()
        .unwrap();

    let copied = sigh.copy_tags(&h, &[tags::PAYLOADDIGEST, tags::SHA1HEADER]);
    assert_eq!(copied, 1);
    assert_eq!(sigh.get(tags::SHA1HEADER).and_then(TagData::as_str), Some("a"));
    assert!(sigh.contains(tags::PAYLOADDIGEST));
}

proptest! {
    #[test]
    fn prop_arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut reader = Cursor::new(data);
        if let Ok(blob) = HeaderBlob::read(&mut reader, tags::HEADER_IMMUTABLE) {
            let _ = blob.import();
        }
    }
}
