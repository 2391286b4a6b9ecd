//! Packet framing

use pkgsig_errors::{Error, SigningError};
use std::fmt;

/// Packet tags this crate cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketTag {
    Signature,
    PublicKey,
    Trust,
    UserId,
    PublicSubkey,
    UserAttribute,
    Other(u8),
}

impl PacketTag {
    #[must_use]
    pub fn from_u8(tag: u8) -> Self {
        match tag {
            2 => Self::Signature,
            6 => Self::PublicKey,
            12 => Self::Trust,
            13 => Self::UserId,
            14 => Self::PublicSubkey,
            17 => Self::UserAttribute,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Signature => 2,
            Self::PublicKey => 6,
            Self::Trust => 12,
            Self::UserId => 13,
            Self::PublicSubkey => 14,
            Self::UserAttribute => 17,
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for PacketTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature => f.write_str("Signature"),
            Self::PublicKey => f.write_str("Public Key"),
            Self::Trust => f.write_str("Trust"),
            Self::UserId => f.write_str("User ID"),
            Self::PublicSubkey => f.write_str("Public Subkey"),
            Self::UserAttribute => f.write_str("User Attribute"),
            Self::Other(tag) => write!(f, "Tag {tag}"),
        }
    }
}

/// One framed packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    pub tag: PacketTag,
    pub body: &'a [u8],
    /// Header plus body length
    pub len: usize,
}

fn malformed(message: impl Into<String>) -> Error {
    SigningError::MalformedPacket(message.into()).into()
}

/// Parse the packet at the start of `data`
fn read_packet(data: &[u8]) -> Result<Packet<'_>, Error> {
    let first = *data.first().ok_or_else(|| malformed("empty packet"))?;
    if first & 0x80 == 0 {
        return Err(malformed(format!("bad packet header byte {first:#04x}")));
    }

    let (tag, header_len, body_len): (u8, usize, usize) = if first & 0x40 != 0 {
        let tag = first & 0x3f;
        let b0 = *data.get(1).ok_or_else(|| malformed("truncated packet length"))?;
        match b0 {
            0..=191 => (tag, 2, usize::from(b0)),
            192..=223 => {
                let b1 = *data.get(2).ok_or_else(|| malformed("truncated packet length"))?;
                (tag, 3, ((usize::from(b0) - 192) << 8) + usize::from(b1) + 192)
            }
            255 => {
                let len = data
                    .get(2..6)
                    .ok_or_else(|| malformed("truncated packet length"))?;
                let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]);
                (tag, 6, len as usize)
            }
            _ => return Err(malformed("partial body lengths are not supported")),
        }
    } else {
        let tag = (first >> 2) & 0x0f;
        let (header_len, body_len): (usize, usize) = match first & 0x03 {
            0 => {
                let b = *data.get(1).ok_or_else(|| malformed("truncated packet length"))?;
                (2, usize::from(b))
            }
            1 => {
                let b = data
                    .get(1..3)
                    .ok_or_else(|| malformed("truncated packet length"))?;
                (3, usize::from(u16::from_be_bytes([b[0], b[1]])))
            }
            2 => {
                let b = data
                    .get(1..5)
                    .ok_or_else(|| malformed("truncated packet length"))?;
                (5, u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize)
            }
            _ => return Err(malformed("indeterminate packet lengths are not supported")),
        };
        (tag, header_len, body_len)
    };

    let len = header_len
        .checked_add(body_len)
        .filter(|&len| len <= data.len())
        .ok_or_else(|| {
            malformed(format!(
                "packet tag {tag} length {body_len} exceeds {} available bytes",
                data.len().saturating_sub(header_len)
            ))
        })?;

    Ok(Packet {
        tag: PacketTag::from_u8(tag),
        body: &data[header_len..len],
        len,
    })
}

/// Iterator over consecutive packets
///
/// Stops after the first framing error.
#[derive(Debug, Clone)]
pub struct Packets<'a> {
    data: &'a [u8],
    failed: bool,
}

impl<'a> Packets<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            failed: false,
        }
    }
}

impl<'a> Iterator for Packets<'a> {
    type Item = Result<Packet<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.data.is_empty() {
            return None;
        }
        match read_packet(self.data) {
            Ok(packet) => {
                self.data = &self.data[packet.len..];
                Some(Ok(packet))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Length of the certificate at the start of `data`
///
/// A certificate starts with a public key packet and extends up to the next
/// public key packet or the end of the buffer.
///
/// # Errors
/// Returns an error if `data` does not start with a public key packet or a
/// packet header is malformed or overruns the buffer.
pub fn certificate_length(data: &[u8]) -> Result<usize, Error> {
    let mut packets = Packets::new(data);
    let first = packets
        .next()
        .ok_or_else(|| malformed("no certificate data"))??;
    if first.tag != PacketTag::PublicKey {
        return Err(malformed(format!(
            "certificate starts with {} packet",
            first.tag
        )));
    }

    let mut len = first.len;
    for packet in packets {
        let packet = packet?;
        if packet.tag == PacketTag::PublicKey {
            break;
        }
        len += packet.len;
    }
    Ok(len)
}

/// Append a new-format packet to `out`
pub fn write_packet(tag: PacketTag, body: &[u8], out: &mut Vec<u8>) {
    out.push(0xc0 | (tag.as_u8() & 0x3f));
    let len = body.len();
    if len < 192 {
        out.push(u8::try_from(len).unwrap_or(u8::MAX));
    } else if len < 8384 {
        let rest = len - 192;
        out.push(u8::try_from((rest >> 8) + 192).unwrap_or(u8::MAX));
        out.push(u8::try_from(rest & 0xff).unwrap_or(u8::MAX));
    } else {
        out.push(0xff);
        out.extend_from_slice(&u32::try_from(len).unwrap_or(u32::MAX).to_be_bytes());
    }
    out.extend_from_slice(body);
}
