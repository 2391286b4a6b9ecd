//! Header tag numbers used by signature verification

/// Region tag of legacy header images
pub const HEADER_IMAGE: u32 = 61;
/// Region tag of the signature header
pub const HEADER_SIGNATURES: u32 = 62;
/// Region tag of the immutable header
pub const HEADER_IMMUTABLE: u32 = 63;

pub const DSAHEADER: u32 = 267;
pub const RSAHEADER: u32 = 268;
pub const SHA1HEADER: u32 = 269;
pub const LONGSIGSIZE: u32 = 270;
pub const LONGARCHIVESIZE: u32 = 271;
pub const SHA256HEADER: u32 = 273;

pub const SIG_SIZE: u32 = 1000;
pub const SIG_PGP: u32 = 1002;
pub const SIG_MD5: u32 = 1004;
pub const SIG_GPG: u32 = 1005;
pub const SIG_PGP5: u32 = 1006;
pub const SIG_PAYLOADSIZE: u32 = 1007;
pub const SIG_RESERVEDSPACE: u32 = 1008;

pub const PAYLOADDIGEST: u32 = 5092;
pub const PAYLOADDIGESTALGO: u32 = 5093;

/// Whether `tag` marks a header region
#[must_use]
pub fn is_region(tag: u32) -> bool {
    (HEADER_IMAGE..=HEADER_IMMUTABLE).contains(&tag)
}
