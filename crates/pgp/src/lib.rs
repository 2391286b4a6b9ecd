#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! OpenPGP support for package signatures and trusted keys
//!
//! Decoding and the public key math are done by `pgp`. This crate adds
//! the pieces package checking needs on top: walking concatenated
//! certificates, the signed trailer and hash prefix of a signature
//! packet, and key ids in the workspace's own types.

mod armor;
mod certs;
mod key;
mod packet;
mod signature;

pub use armor::{armor, parse_armored, Armor, ArmorKind, ARMOR_MARKER};
pub use certs::{certificates, Certificates};
pub use key::{Certificate, PublicKey};
pub use packet::{certificate_length, write_packet, Packet, PacketTag, Packets};
pub use signature::SignaturePacket;

/// Options for packet parsing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Dump every parsed packet as a debug event
    pub print_packets: bool,
}

/// Public key algorithm ids
pub mod algo {
    pub const RSA: u8 = 1;
    pub const RSA_ENCRYPT: u8 = 2;
    pub const RSA_SIGN: u8 = 3;
    pub const DSA: u8 = 17;
    pub const EDDSA: u8 = 22;
    pub const ED25519: u8 = 27;

    /// Display name for a public key algorithm id
    #[must_use]
    pub fn name(id: u8) -> &'static str {
        match id {
            RSA | RSA_ENCRYPT | RSA_SIGN => "RSA",
            DSA => "DSA",
            EDDSA | ED25519 => "EdDSA",
            _ => "unknown",
        }
    }

    /// Whether signatures made with `id` can be checked
    #[must_use]
    pub fn can_verify(id: u8) -> bool {
        matches!(id, RSA | RSA_SIGN | EDDSA | ED25519)
    }
}
