//! Shared fixtures: signing keys, certificates and signed packages
//!
//! Keys are generated per test; certificates are v4 public key packets
//! followed by a user id, and signatures are v4 binary signatures over
//! SHA256.

#![allow(dead_code)]

use ed25519_dalek::{Signer as _, SigningKey};
use pkgsig_hash::{digest, DigestContext};
use pkgsig_header::{HeaderBuilder, Lead, TagData};
use pkgsig_pgp::{algo, armor, write_packet, ArmorKind, Certificate, PacketTag, ParseOptions};
use pkgsig_types::{tags, HashAlgorithm, KeyId};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::Sha256;

/// Encode a big-endian integer as an OpenPGP MPI
pub fn mpi(value: &[u8]) -> Vec<u8> {
    let value = &value[value.iter().position(|&b| b != 0).unwrap_or(value.len())..];
    let bits = value
        .first()
        .map_or(0, |top| (value.len() - 1) * 8 + (8 - top.leading_zeros() as usize));
    let mut out = u16::try_from(bits).unwrap().to_be_bytes().to_vec();
    out.extend_from_slice(value);
    out
}

/// A private signing key
pub enum TestKey {
    Rsa(RsaPrivateKey),
    Ed25519(SigningKey),
}

impl TestKey {
    pub fn rsa() -> Self {
        Self::Rsa(RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap())
    }

    pub fn ed25519(seed: u8) -> Self {
        Self::Ed25519(SigningKey::from_bytes(&[seed; 32]))
    }

    fn algorithm(&self) -> u8 {
        match self {
            Self::Rsa(_) => algo::RSA,
            Self::Ed25519(_) => algo::EDDSA,
        }
    }

    fn key_body(&self) -> Vec<u8> {
        let mut body = vec![4, 0x5f, 0, 0, 0, self.algorithm()];
        match self {
            Self::Rsa(key) => {
                body.extend(mpi(&key.n().to_bytes_be()));
                body.extend(mpi(&key.e().to_bytes_be()));
            }
            Self::Ed25519(key) => {
                body.push(9);
                body.extend_from_slice(&[0x2b, 0x06, 0x01, 0x04, 0x01, 0xda, 0x47, 0x0f, 0x01]);
                let mut point = vec![0x40];
                point.extend_from_slice(key.verifying_key().as_bytes());
                body.extend(mpi(&point));
            }
        }
        body
    }

    /// Certificate packets: public key and user id
    pub fn certificate(&self, user_id: &str) -> Vec<u8> {
        let mut packets = Vec::new();
        write_packet(PacketTag::PublicKey, &self.key_body(), &mut packets);
        write_packet(PacketTag::UserId, user_id.as_bytes(), &mut packets);
        packets
    }

    pub fn key_id(&self) -> KeyId {
        Certificate::parse(&self.certificate("id"), ParseOptions::default())
            .unwrap()
            .key_id()
    }

    /// A v4 SHA256 binary signature packet over `data`
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut hashed_sub = vec![5, 2, 0x65, 0x00, 0x00, 0x00];
        hashed_sub.extend_from_slice(&[9, 16]);
        hashed_sub.extend_from_slice(self.key_id().as_bytes());

        let mut head = vec![4, 0x00, self.algorithm(), 8];
        head.extend_from_slice(&u16::try_from(hashed_sub.len()).unwrap().to_be_bytes());
        head.extend_from_slice(&hashed_sub);

        let mut ctx = DigestContext::new(HashAlgorithm::Sha256);
        ctx.update(data);
        ctx.update(&head);
        ctx.update(&[0x04, 0xff]);
        ctx.update(&u32::try_from(head.len()).unwrap().to_be_bytes());
        let hash = ctx.finalize();

        let mpis = match self {
            Self::Rsa(key) => vec![key.sign(Pkcs1v15Sign::new::<Sha256>(), &hash).unwrap()],
            Self::Ed25519(key) => {
                let raw = key.sign(&hash).to_bytes();
                vec![raw[..32].to_vec(), raw[32..].to_vec()]
            }
        };

        let mut body = head;
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(&hash[..2]);
        for m in &mpis {
            body.extend(mpi(m));
        }
        let mut packet = Vec::new();
        write_packet(PacketTag::Signature, &body, &mut packet);
        packet
    }
}

/// Armor certificates into one public key block
pub fn armored(certs: &[Vec<u8>]) -> String {
    armor(&ArmorKind::PublicKey, &certs.concat())
}

/// Builds a package: lead, signature header, immutable header, payload
pub struct PackageBuilder {
    header: Vec<u8>,
    payload: Vec<u8>,
    header_signature: Option<Vec<u8>>,
    package_signature: Option<Vec<u8>>,
    md5: bool,
}

impl PackageBuilder {
    pub fn new() -> Self {
        let payload: Vec<u8> = (0..40_000u32).map(|i| (i * 7 % 253) as u8).collect();
        let header = HeaderBuilder::new()
            .with(1000, TagData::String("demo".into()))
            .with(1001, TagData::String("1.0".into()))
            .with(
                tags::PAYLOADDIGEST,
                TagData::StringArray(vec![hex::encode(digest(HashAlgorithm::Sha256, &payload))]),
            )
            .with(tags::PAYLOADDIGESTALGO, TagData::Int32(vec![8]))
            .build_immutable();
        Self {
            header,
            payload,
            header_signature: None,
            package_signature: None,
            md5: true,
        }
    }

    /// Add an RSAHEADER signature over the immutable header
    pub fn header_signed_by(mut self, key: &TestKey) -> Self {
        self.header_signature = Some(key.sign(&self.header));
        self
    }

    /// Add a PGP signature over header and payload
    pub fn package_signed_by(mut self, key: &TestKey) -> Self {
        let signed = [self.header.as_slice(), self.payload.as_slice()].concat();
        self.package_signature = Some(key.sign(&signed));
        self
    }

    /// Leave out the MD5 over header and payload
    pub fn without_md5(mut self) -> Self {
        self.md5 = false;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut sig = HeaderBuilder::new();
        if let Some(packet) = &self.header_signature {
            sig.push(tags::RSAHEADER, TagData::Bin(packet.clone()));
        }
        sig.push(
            tags::SHA256HEADER,
            TagData::String(hex::encode(digest(HashAlgorithm::Sha256, &self.header))),
        );
        if let Some(packet) = &self.package_signature {
            sig.push(tags::SIG_PGP, TagData::Bin(packet.clone()));
        }
        if self.md5 {
            let both = [self.header.as_slice(), self.payload.as_slice()].concat();
            sig.push(tags::SIG_MD5, TagData::Bin(digest(HashAlgorithm::Md5, &both)));
        }

        let mut out = Lead::new("demo-1.0-1").to_bytes().to_vec();
        out.extend(sig.build_signature());
        out.extend(&self.header);
        out.extend(&self.payload);
        out
    }
}

impl Default for PackageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
