//! Signature manifest: the checks declared in a signature header

use pkgsig_hash::ContextId;
use pkgsig_header::{Header, HeaderEntry, TagData};
use pkgsig_pgp::{algo, ParseOptions, SignaturePacket};
use pkgsig_types::{tags, HashAlgorithm, SigRange, VerifyFlags};
use std::fmt;

/// What kind of check an item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Size,
    Md5,
    Sha1,
    Sha256,
    Rsa,
    Dsa,
    Pgp,
    Gpg,
    PayloadDigest,
    Other,
    Unknown,
}

impl ItemKind {
    #[must_use]
    pub fn is_signature(self) -> bool {
        matches!(self, Self::Rsa | Self::Dsa | Self::Pgp | Self::Gpg)
    }
}

/// How an item's hash algorithm is resolved
#[derive(Debug, Clone, Copy)]
enum DigestSource {
    None,
    Fixed(HashAlgorithm),
    Signature,
    Payload,
}

struct Class {
    tag: u32,
    kind: ItemKind,
    range: SigRange,
    disabler: VerifyFlags,
    source: DigestSource,
    display: &'static str,
}

const UNKNOWN_DISPLAY: &str = "???";
const UNKNOWN_DISPLAY_UPPER: &str = "?UnknownSignatureType?";

const fn class(
    tag: u32,
    kind: ItemKind,
    range: SigRange,
    disabler: VerifyFlags,
    source: DigestSource,
    display: &'static str,
) -> Class {
    Class {
        tag,
        kind,
        range,
        disabler,
        source,
        display,
    }
}

#[rustfmt::skip]
static CLASSES: &[Class] = &[
    class(tags::SIG_SIZE, ItemKind::Size, SigRange::COMBINED, VerifyFlags::empty(), DigestSource::None, "size"),
    class(tags::SIG_PGP, ItemKind::Pgp, SigRange::COMBINED, VerifyFlags::NORSA, DigestSource::Signature, "pgp"),
    class(tags::SIG_MD5, ItemKind::Md5, SigRange::COMBINED, VerifyFlags::NOMD5, DigestSource::Fixed(HashAlgorithm::Md5), "md5"),
    class(tags::SIG_GPG, ItemKind::Gpg, SigRange::COMBINED, VerifyFlags::NODSA, DigestSource::Signature, "gpg"),
    class(tags::SIG_PGP5, ItemKind::Pgp, SigRange::COMBINED, VerifyFlags::NORSA, DigestSource::Signature, "pgp"),
    class(tags::SIG_PAYLOADSIZE, ItemKind::Other, SigRange::PAYLOAD, VerifyFlags::empty(), DigestSource::None, "size"),
    class(tags::SIG_RESERVEDSPACE, ItemKind::Other, SigRange::empty(), VerifyFlags::empty(), DigestSource::None, UNKNOWN_DISPLAY),
    class(tags::DSAHEADER, ItemKind::Dsa, SigRange::HEADER, VerifyFlags::NODSAHEADER, DigestSource::Signature, "dsa"),
    class(tags::RSAHEADER, ItemKind::Rsa, SigRange::HEADER, VerifyFlags::NORSAHEADER, DigestSource::Signature, "rsa"),
    class(tags::SHA1HEADER, ItemKind::Sha1, SigRange::HEADER, VerifyFlags::NOSHA1HEADER, DigestSource::Fixed(HashAlgorithm::Sha1), "sha1"),
    class(tags::SHA256HEADER, ItemKind::Sha256, SigRange::HEADER, VerifyFlags::NOSHA256HEADER, DigestSource::Fixed(HashAlgorithm::Sha256), "sha256"),
    class(tags::PAYLOADDIGEST, ItemKind::PayloadDigest, SigRange::PAYLOAD, VerifyFlags::NOPAYLOAD, DigestSource::Payload, "payload"),
];

static UNKNOWN: Class = class(
    0,
    ItemKind::Unknown,
    SigRange::empty(),
    VerifyFlags::empty(),
    DigestSource::None,
    UNKNOWN_DISPLAY,
);

fn classify(tag: u32) -> &'static Class {
    CLASSES.iter().find(|c| c.tag == tag).unwrap_or(&UNKNOWN)
}

/// The value an item is checked against
#[derive(Debug, Clone)]
pub enum Expected {
    /// Nothing to compare
    None,
    /// Raw digest bytes
    Digest(Vec<u8>),
    Signature(Box<SignaturePacket>),
}

/// One declared digest or signature check
#[derive(Debug, Clone)]
pub struct SignatureItem {
    pub tag: u32,
    pub kind: ItemKind,
    pub range: SigRange,
    pub disabler: VerifyFlags,
    pub algorithm: Option<HashAlgorithm>,
    pub context_id: ContextId,
    pub expected: Expected,
    display: &'static str,
    description: String,
    parse_error: Option<String>,
}

fn range_name(range: SigRange) -> &'static str {
    if range == SigRange::HEADER {
        "Header "
    } else if range == SigRange::PAYLOAD {
        "Payload "
    } else {
        ""
    }
}

fn hex_digest(data: &TagData, algorithm: HashAlgorithm) -> Result<Vec<u8>, String> {
    let text = data
        .as_str()
        .ok_or_else(|| format!("invalid type {:?}", data.tag_type()))?;
    if text.len() != algorithm.digest_len() * 2 {
        return Err(format!("invalid size {}", text.len()));
    }
    hex::decode(text).map_err(|_| "invalid hex".to_string())
}

impl SignatureItem {
    /// Build an item from one signature header entry
    ///
    /// `header` is consulted for companion tags such as the payload digest
    /// algorithm. Entries that fail validation still produce an item; it
    /// carries the failure in [`SignatureItem::parse_error`].
    #[must_use]
    pub fn from_entry(entry: &HeaderEntry, header: &Header, options: ParseOptions) -> Self {
        let class = classify(entry.tag);
        let mut item = Self {
            tag: entry.tag,
            kind: class.kind,
            range: class.range,
            disabler: class.disabler,
            algorithm: None,
            context_id: entry.tag,
            expected: Expected::None,
            display: class.display,
            description: String::new(),
            parse_error: None,
        };

        match class.source {
            DigestSource::None => {}
            DigestSource::Fixed(algorithm) => {
                item.algorithm = Some(algorithm);
                let value = if item.kind == ItemKind::Md5 {
                    match entry.data.as_bytes() {
                        Some(raw) if raw.len() == algorithm.digest_len() => Ok(raw.to_vec()),
                        Some(raw) => Err(format!("invalid size {}", raw.len())),
                        None => Err(format!("invalid type {:?}", entry.data.tag_type())),
                    }
                } else {
                    hex_digest(&entry.data, algorithm)
                };
                item.set_expected(value);
            }
            DigestSource::Payload => {
                let algorithm = match header
                    .get(tags::PAYLOADDIGESTALGO)
                    .and_then(TagData::as_u64)
                {
                    Some(id) => u8::try_from(id).ok().and_then(HashAlgorithm::from_pgp_id),
                    None => Some(HashAlgorithm::Sha256),
                };
                item.algorithm = algorithm;
                if let Some(algorithm) = algorithm {
                    let value = match entry.data {
                        TagData::StringArray(_) => hex_digest(&entry.data, algorithm),
                        _ => Err(format!("invalid type {:?}", entry.data.tag_type())),
                    };
                    item.set_expected(value);
                }
            }
            DigestSource::Signature => match entry.data.as_bytes() {
                Some(raw) if entry.data.tag_type() == pkgsig_header::TagType::Bin => {
                    match SignaturePacket::parse(raw, options) {
                        Ok(sig) => {
                            item.algorithm = sig.hash_algorithm();
                            item.expected = Expected::Signature(Box::new(sig));
                        }
                        Err(e) => item.parse_error = Some(e.to_string()),
                    }
                }
                _ => {
                    item.parse_error =
                        Some(format!("invalid type {:?}", entry.data.tag_type()));
                }
            },
        }

        item.description = item.describe();
        if let Some(error) = item.parse_error.take() {
            item.parse_error = Some(format!("{} tag {}: {error}", item.description, item.tag));
        }
        item
    }

    fn set_expected(&mut self, value: Result<Vec<u8>, String>) {
        match value {
            Ok(raw) => self.expected = Expected::Digest(raw),
            Err(e) => self.parse_error = Some(e),
        }
    }

    fn describe(&self) -> String {
        let range = range_name(self.range);
        match (&self.expected, self.algorithm) {
            (Expected::Signature(sig), Some(hash)) => format!(
                "{range}V{} {}/{} Signature, key ID {}",
                sig.version,
                algo::name(sig.pubkey_algo),
                hash,
                sig.issuer_hex()
            ),
            (Expected::Signature(sig), None) => format!(
                "{range}V{} {} Signature, key ID {}",
                sig.version,
                algo::name(sig.pubkey_algo),
                sig.issuer_hex()
            ),
            (_, Some(hash)) if !self.kind.is_signature() => format!("{range}{hash} digest"),
            _ => format!("{range}{} signature tag {}", self.display, self.tag),
        }
    }

    /// Whether `flags` exclude this item from evaluation
    #[must_use]
    pub fn is_disabled(&self, flags: VerifyFlags) -> bool {
        self.algorithm.is_none()
            || flags.intersects(self.disabler)
            || (flags.contains(VerifyFlags::NEEDPAYLOAD) && self.range.contains(SigRange::PAYLOAD))
    }

    /// Human readable description used in messages
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Validation failure of the header entry, if any
    #[must_use]
    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    /// Short name printed by the terse reporter
    #[must_use]
    pub fn token(&self, failed: bool) -> &'static str {
        if !failed {
            return self.display;
        }
        match self.kind {
            ItemKind::Size => "SIZE",
            ItemKind::Md5 => "MD5",
            ItemKind::Sha1 => "SHA1",
            ItemKind::Sha256 => "SHA256",
            ItemKind::Rsa => "RSA",
            ItemKind::Dsa => "DSA",
            ItemKind::Pgp => "PGP",
            ItemKind::Gpg => "GPG",
            ItemKind::PayloadDigest => "PAYLOAD",
            ItemKind::Other | ItemKind::Unknown => UNKNOWN_DISPLAY_UPPER,
        }
    }
}

impl fmt::Display for SignatureItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Read-only view of a signature header as a sequence of checks
#[derive(Debug, Clone, Copy)]
pub struct Manifest<'a> {
    header: &'a Header,
    options: ParseOptions,
}

impl<'a> Manifest<'a> {
    #[must_use]
    pub fn new(header: &'a Header, options: ParseOptions) -> Self {
        Self { header, options }
    }

    /// Items in header storage order, built lazily
    #[must_use]
    pub fn items(&self) -> Items<'a> {
        Items {
            entries: self.header.entries(),
            header: self.header,
            options: self.options,
        }
    }
}

/// Lazy iterator over the items of a [`Manifest`]
pub struct Items<'a> {
    entries: std::slice::Iter<'a, HeaderEntry>,
    header: &'a Header,
    options: ParseOptions,
}

impl Iterator for Items<'_> {
    type Item = SignatureItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries
            .next()
            .map(|entry| SignatureItem::from_entry(entry, self.header, self.options))
    }
}
