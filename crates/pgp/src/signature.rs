//! Signature packets

use crate::algo;
use crate::packet::{PacketTag, Packets};
use crate::ParseOptions;
use pgp::packet::{Packet, PacketParser, Signature};
use pgp::types::PublicKeyTrait;
use pkgsig_errors::{Error, SigningError};
use pkgsig_types::{HashAlgorithm, KeyId};
use tracing::debug;

fn malformed(message: impl Into<String>) -> Error {
    SigningError::InvalidSignatureFormat(message.into()).into()
}

fn be16(data: &[u8], at: usize) -> Option<usize> {
    data.get(at..at + 2)
        .map(|b| usize::from(u16::from_be_bytes([b[0], b[1]])))
}

/// Fixed fields of a signature body plus the bytes it signs
struct SignedArea {
    version: u8,
    pubkey_algo: u8,
    hash_algo: u8,
    hash_prefix: [u8; 2],
    trailer: Vec<u8>,
}

impl SignedArea {
    fn read(body: &[u8]) -> Result<Self, Error> {
        let truncated = || malformed("truncated signature");
        let version = *body.first().ok_or_else(truncated)?;
        match version {
            3 => {
                if body.get(1) != Some(&5) {
                    return Err(malformed("v3 hashed length must be 5"));
                }
                let fixed = body.get(..19).ok_or_else(truncated)?;
                Ok(Self {
                    version,
                    pubkey_algo: fixed[15],
                    hash_algo: fixed[16],
                    hash_prefix: [fixed[17], fixed[18]],
                    trailer: fixed[2..7].to_vec(),
                })
            }
            4 => {
                let hashed_len = be16(body, 4).ok_or_else(truncated)?;
                let signed_len = 6 + hashed_len;
                let unhashed_len = be16(body, signed_len).ok_or_else(truncated)?;
                let prefix_at = signed_len + 2 + unhashed_len;
                let prefix = body.get(prefix_at..prefix_at + 2).ok_or_else(truncated)?;

                let mut trailer = Vec::with_capacity(signed_len + 6);
                trailer.extend_from_slice(&body[..signed_len]);
                trailer.extend_from_slice(&[0x04, 0xff]);
                trailer.extend_from_slice(
                    &u32::try_from(signed_len).unwrap_or(u32::MAX).to_be_bytes(),
                );
                Ok(Self {
                    version,
                    pubkey_algo: body[2],
                    hash_algo: body[3],
                    hash_prefix: [prefix[0], prefix[1]],
                    trailer,
                })
            }
            other => Err(SigningError::Unsupported {
                what: "signature version".to_string(),
                id: other,
            }
            .into()),
        }
    }
}

/// A parsed v3 or v4 signature
#[derive(Debug, Clone)]
pub struct SignaturePacket {
    pub version: u8,
    pub pubkey_algo: u8,
    pub hash_algo: u8,
    /// Leftmost two bytes of the signed digest
    pub hash_prefix: [u8; 2],
    pub issuer: Option<KeyId>,
    trailer: Vec<u8>,
    inner: Signature,
}

impl SignaturePacket {
    /// Parse a framed signature packet, as stored in a package header
    ///
    /// # Errors
    /// Returns an error if the data is not exactly one signature packet or
    /// the packet body is malformed.
    pub fn parse(data: &[u8], options: ParseOptions) -> Result<Self, Error> {
        let mut packets = Packets::new(data);
        let packet = packets
            .next()
            .ok_or_else(|| malformed("empty signature"))??;
        if packet.tag != PacketTag::Signature {
            return Err(malformed(format!(
                "expected signature, found {} packet",
                packet.tag
            )));
        }
        if packets.next().is_some() {
            return Err(malformed("trailing data after signature packet"));
        }
        let area = SignedArea::read(packet.body)?;

        let inner = match PacketParser::new(data).next() {
            Some(Ok(Packet::Signature(sig))) => sig,
            Some(Ok(_)) | None => return Err(malformed("no signature packet")),
            Some(Err(e)) => return Err(malformed(e.to_string())),
        };
        let issuer = inner
            .issuer()
            .first()
            .and_then(|id| KeyId::from_tail(id.as_ref()));

        if options.print_packets {
            debug!(
                version = area.version,
                pubkey = algo::name(area.pubkey_algo),
                hash = area.hash_algo,
                issuer = %issuer.map(|id| id.to_hex()).unwrap_or_default(),
                packet = ?inner,
                "packet: Signature"
            );
        }

        Ok(Self {
            version: area.version,
            pubkey_algo: area.pubkey_algo,
            hash_algo: area.hash_algo,
            hash_prefix: area.hash_prefix,
            issuer,
            trailer: area.trailer,
            inner,
        })
    }

    /// Digest algorithm, if it is one we support
    #[must_use]
    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        HashAlgorithm::from_pgp_id(self.hash_algo)
    }

    /// Bytes appended to the signed data before finalizing the digest
    #[must_use]
    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }

    /// Issuer key id formatted for messages
    #[must_use]
    pub fn issuer_hex(&self) -> String {
        self.issuer
            .map_or_else(|| "unknown".to_string(), |id| id.short())
    }

    pub(crate) fn verify_with<K: PublicKeyTrait>(
        &self,
        key: &K,
        digest: &[u8],
    ) -> Result<(), Error> {
        let failed = |reason: String| -> Error {
            SigningError::VerificationFailed { reason }.into()
        };
        let config = self
            .inner
            .config()
            .ok_or_else(|| failed("signature of unknown version".to_string()))?;
        let value = self
            .inner
            .signature()
            .ok_or_else(|| failed("signature without value".to_string()))?;
        PublicKeyTrait::verify_signature(key, config.hash_alg, digest, value)
            .map_err(|e| failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::write_packet;

    fn mpi(value: &[u8]) -> Vec<u8> {
        let bits = (value.len() - 1) * 8 + (8 - value[0].leading_zeros() as usize);
        let mut out = u16::try_from(bits).unwrap().to_be_bytes().to_vec();
        out.extend_from_slice(value);
        out
    }

    fn v4_body(issuer: [u8; 8], created: u32) -> Vec<u8> {
        let mut hashed = vec![5, 2];
        hashed.extend_from_slice(&created.to_be_bytes());
        let mut unhashed = vec![9, 16];
        unhashed.extend_from_slice(&issuer);

        let mut body = vec![4, 0x00, algo::RSA, 8];
        body.extend_from_slice(&u16::try_from(hashed.len()).unwrap().to_be_bytes());
        body.extend_from_slice(&hashed);
        body.extend_from_slice(&u16::try_from(unhashed.len()).unwrap().to_be_bytes());
        body.extend_from_slice(&unhashed);
        body.extend_from_slice(&[0xab, 0xcd]);
        body.extend(mpi(&[0x55; 64]));
        body
    }

    #[test]
    fn test_v4_fields_and_trailer() {
        let body = v4_body([1, 2, 3, 4, 5, 6, 7, 8], 1_700_000_000);
        let mut data = Vec::new();
        write_packet(PacketTag::Signature, &body, &mut data);

        let sig = SignaturePacket::parse(&data, ParseOptions::default()).unwrap();
        assert_eq!(sig.version, 4);
        assert_eq!(sig.hash_algorithm(), Some(HashAlgorithm::Sha256));
        assert_eq!(sig.hash_prefix, [0xab, 0xcd]);
        assert_eq!(sig.issuer_hex(), "05060708");

        let trailer = sig.trailer();
        assert_eq!(&trailer[..12], &body[..12]);
        assert_eq!(&trailer[12..], &[0x04, 0xff, 0, 0, 0, 12]);
    }

    #[test]
    fn test_v3_signed_area() {
        let mut body = vec![3, 5, 0x00];
        body.extend_from_slice(&42u32.to_be_bytes());
        body.extend_from_slice(&[9; 8]);
        body.extend_from_slice(&[algo::RSA, 2, 0x12, 0x34]);
        body.extend(mpi(&[0x77; 32]));

        let area = SignedArea::read(&body).unwrap();
        assert_eq!(area.hash_algo, 2);
        assert_eq!(area.hash_prefix, [0x12, 0x34]);
        assert_eq!(area.trailer, vec![0, 0, 0, 0, 42]);
    }

    #[test]
    fn test_rejects_non_signature_packet() {
        let mut data = Vec::new();
        write_packet(PacketTag::UserId, b"x", &mut data);
        assert!(SignaturePacket::parse(&data, ParseOptions::default()).is_err());
    }

    #[test]
    fn test_truncated_body() {
        let body = v4_body([0; 8], 0);
        let mut data = Vec::new();
        write_packet(PacketTag::Signature, &body[..body.len() - 70], &mut data);
        assert!(SignaturePacket::parse(&data, ParseOptions::default()).is_err());
    }

    #[test]
    fn test_unknown_version() {
        assert!(SignedArea::read(&[7, 0, 1, 8]).is_err());
    }
}
