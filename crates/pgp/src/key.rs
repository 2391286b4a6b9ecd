//! Public keys and certificates

use crate::algo;
use crate::packet::{PacketTag, Packets};
use crate::signature::SignaturePacket;
use crate::ParseOptions;
use pgp::composed::{Deserializable, SignedPublicKey};
use pgp::packet::PublicSubkey;
use pgp::types::KeyDetails;
use pkgsig_errors::{Error, SigningError};
use pkgsig_types::KeyId;
use tracing::debug;

fn invalid(message: impl Into<String>) -> Error {
    SigningError::InvalidPublicKey(message.into()).into()
}

#[derive(Debug, Clone)]
enum KeyPacket {
    Primary(pgp::packet::PublicKey),
    Subkey(PublicSubkey),
}

/// A primary key or subkey
#[derive(Debug, Clone)]
pub struct PublicKey {
    /// Expiry time of the certificate, seconds since the epoch
    pub expires: Option<u64>,
    key_id: KeyId,
    packet: KeyPacket,
}

fn key_id_of(key: &impl KeyDetails) -> Result<KeyId, Error> {
    let id = key.key_id();
    KeyId::from_tail(id.as_ref()).ok_or_else(|| invalid("short key id"))
}

impl PublicKey {
    fn new(packet: KeyPacket, expires: Option<u64>) -> Result<Self, Error> {
        let key_id = match &packet {
            KeyPacket::Primary(key) => key_id_of(key)?,
            KeyPacket::Subkey(key) => key_id_of(key)?,
        };
        Ok(Self {
            expires,
            key_id,
            packet,
        })
    }

    #[must_use]
    pub fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// Whether the key has expired at `now` (seconds since the epoch)
    #[must_use]
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires.is_some_and(|at| at <= now)
    }

    /// Check `sig` over `digest`
    ///
    /// `digest` must be the finalized hash of the signed data plus the
    /// signature trailer.
    ///
    /// # Errors
    /// Returns `SigningError::Unsupported` for DSA and unknown algorithms
    /// and `SigningError::VerificationFailed` when the signature does not
    /// match.
    pub fn verify(&self, sig: &SignaturePacket, digest: &[u8]) -> Result<(), Error> {
        if !algo::can_verify(sig.pubkey_algo) {
            return Err(SigningError::Unsupported {
                what: "public key algorithm".to_string(),
                id: sig.pubkey_algo,
            }
            .into());
        }
        match &self.packet {
            KeyPacket::Primary(key) => sig.verify_with(key, digest),
            KeyPacket::Subkey(key) => sig.verify_with(key, digest),
        }
    }
}

/// A transferable public key: primary key, user ids and subkeys
#[derive(Debug, Clone)]
pub struct Certificate {
    pub primary: PublicKey,
    pub user_ids: Vec<String>,
    pub subkeys: Vec<PublicKey>,
    raw: Vec<u8>,
}

impl Certificate {
    /// Parse one certificate
    ///
    /// Self-signatures are consulted for key expiration only; they are not
    /// verified.
    ///
    /// # Errors
    /// Returns an error if the data does not start with a public key
    /// packet, contains a second primary key, or does not parse as a
    /// transferable public key.
    pub fn parse(data: &[u8], options: ParseOptions) -> Result<Self, Error> {
        let mut user_ids = Vec::new();
        for (index, packet) in Packets::new(data).enumerate() {
            let packet = packet.map_err(|e| invalid(e.to_string()))?;
            if options.print_packets {
                debug!(tag = %packet.tag, len = packet.body.len(), "packet");
            }
            match (index, packet.tag) {
                (0, PacketTag::PublicKey) => {}
                (0, tag) => return Err(invalid(format!("certificate starts with {tag} packet"))),
                (_, PacketTag::PublicKey) => return Err(invalid("more than one primary key")),
                (_, PacketTag::UserId) => {
                    user_ids.push(String::from_utf8_lossy(packet.body).into_owned());
                }
                _ => {}
            }
        }
        if data.is_empty() {
            return Err(invalid("empty certificate"));
        }

        let key = SignedPublicKey::from_bytes(data).map_err(|e| invalid(e.to_string()))?;
        let expires = key.expires_at().and_then(|at| u64::try_from(at.timestamp()).ok());
        let primary = PublicKey::new(KeyPacket::Primary(key.primary_key.clone()), expires)?;
        let subkeys = key
            .public_subkeys
            .iter()
            .map(|sub| PublicKey::new(KeyPacket::Subkey(sub.key.clone()), expires))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            key_id = %primary.key_id(),
            user_ids = user_ids.len(),
            subkeys = subkeys.len(),
            "certificate parsed"
        );
        Ok(Self {
            primary,
            user_ids,
            subkeys,
            raw: data.to_vec(),
        })
    }

    #[must_use]
    pub fn key_id(&self) -> KeyId {
        self.primary.key_id()
    }

    /// First user id, if any
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_ids.first().map(String::as_str)
    }

    /// Primary key followed by subkeys
    pub fn keys(&self) -> impl Iterator<Item = &PublicKey> {
        std::iter::once(&self.primary).chain(self.subkeys.iter())
    }

    #[must_use]
    pub fn find_key(&self, id: KeyId) -> Option<&PublicKey> {
        self.keys().find(|k| k.key_id() == id)
    }

    /// The raw packets this certificate was parsed from
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}
