//! Raw header blobs as read from a package

use crate::header::{Header, HeaderEntry, TagData, TagType};
use crate::read_full;
use pkgsig_errors::{Error, PackageError};
use pkgsig_types::tags;
use std::io::Read;
use tracing::debug;

pub(crate) const HEADER_MAGIC: [u8; 8] = [0x8e, 0xad, 0xe8, 0x01, 0, 0, 0, 0];

/// Upper bound on index entries in one header
const MAX_INDEX_ENTRIES: u32 = 0xffff;
/// Upper bound on the data store of the immutable header
pub const MAX_HEADER_DATA: u32 = 256 * 1024 * 1024;
/// Upper bound on the data store of the signature header
pub const MAX_SIGNATURE_DATA: u32 = 64 * 1024 * 1024;

/// An unparsed header: index entries plus data store
#[derive(Debug, Clone)]
pub struct HeaderBlob {
    region_tag: u32,
    index: Vec<u8>,
    data: Vec<u8>,
}

fn region_name(region_tag: u32) -> &'static str {
    if region_tag == tags::HEADER_SIGNATURES {
        "signature header"
    } else {
        "header"
    }
}

fn be32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

struct IndexEntry {
    tag: u32,
    ty: u32,
    offset: i32,
    count: u32,
}

impl HeaderBlob {
    /// Read one header blob of the given region
    ///
    /// The signature header is followed by padding up to an eight byte
    /// boundary, which is consumed as well.
    ///
    /// # Errors
    /// Returns an error on short reads, bad magic, out of range sizes or a
    /// malformed region marker.
    pub fn read<R: Read>(reader: &mut R, region_tag: u32) -> Result<Self, Error> {
        let what = region_name(region_tag);

        let mut intro = [0u8; 16];
        read_full(reader, &mut intro, what)?;
        if intro[..8] != HEADER_MAGIC {
            return Err(PackageError::BadHeaderMagic {
                region: what.to_string(),
            }
            .into());
        }

        let il = be32(&intro, 8);
        let dl = be32(&intro, 12);
        let max_data = if region_tag == tags::HEADER_SIGNATURES {
            MAX_SIGNATURE_DATA
        } else {
            MAX_HEADER_DATA
        };
        if il == 0 || il > MAX_INDEX_ENTRIES {
            return Err(PackageError::InvalidHeader {
                message: format!("{what}: tag count {il} out of range"),
            }
            .into());
        }
        if dl > max_data {
            return Err(PackageError::InvalidHeader {
                message: format!("{what}: data size {dl} out of range"),
            }
            .into());
        }

        let mut index = vec![0u8; il as usize * 16];
        read_full(reader, &mut index, what)?;
        let mut data = vec![0u8; dl as usize];
        read_full(reader, &mut data, what)?;

        if region_tag == tags::HEADER_SIGNATURES {
            let pad = (8 - (dl as usize % 8)) % 8;
            let mut padding = [0u8; 8];
            read_full(reader, &mut padding[..pad], what)?;
        }

        let blob = Self {
            region_tag,
            index,
            data,
        };
        blob.verify_region()?;
        debug!(region = what, tags = il, bytes = dl, "header blob read");
        Ok(blob)
    }

    /// Number of index entries, region marker included
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.index.len() / 16
    }

    /// Size of the data store
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    fn entry(&self, i: usize) -> IndexEntry {
        let at = i * 16;
        IndexEntry {
            tag: be32(&self.index, at),
            ty: be32(&self.index, at + 4),
            offset: i32::from_be_bytes([
                self.index[at + 8],
                self.index[at + 9],
                self.index[at + 10],
                self.index[at + 11],
            ]),
            count: be32(&self.index, at + 12),
        }
    }

    fn has_region(&self) -> bool {
        tags::is_region(self.entry(0).tag)
    }

    fn verify_region(&self) -> Result<(), Error> {
        let first = self.entry(0);
        if !tags::is_region(first.tag) {
            // Legacy header without a region marker
            return Ok(());
        }
        let what = region_name(self.region_tag);
        let in_bounds = usize::try_from(first.offset)
            .ok()
            .and_then(|o| o.checked_add(16))
            .is_some_and(|end| end <= self.data.len());
        if first.ty != TagType::Bin as u32 || first.count != 16 || !in_bounds {
            return Err(PackageError::InvalidHeader {
                message: format!(
                    "{what}: region tag {} type {} offset {} count {} invalid",
                    first.tag, first.ty, first.offset, first.count
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Decode every entry, preserving storage order
    ///
    /// # Errors
    /// Returns an error if an entry has an unknown type, a misaligned or out
    /// of bounds offset, or undecodable contents.
    pub fn import(&self) -> Result<Header, Error> {
        let region = self.has_region().then(|| self.entry(0).tag);
        let skip = usize::from(region.is_some());
        let mut entries = Vec::with_capacity(self.tag_count().saturating_sub(skip));

        for i in skip..self.tag_count() {
            let e = self.entry(i);
            let data = self.decode(&e).map_err(|message| PackageError::InvalidTag {
                tag: e.tag,
                message,
            })?;
            entries.push(HeaderEntry { tag: e.tag, data });
        }
        Ok(Header::from_parts(region, entries))
    }

    fn decode(&self, e: &IndexEntry) -> Result<TagData, String> {
        let ty = TagType::from_u32(e.ty).ok_or_else(|| format!("unknown type {}", e.ty))?;
        let offset =
            usize::try_from(e.offset).map_err(|_| format!("negative offset {}", e.offset))?;
        let count = e.count as usize;
        if offset > self.data.len() {
            return Err(format!("offset {offset} beyond data ({})", self.data.len()));
        }
        if offset % ty.alignment() != 0 {
            return Err(format!("offset {offset} misaligned for {ty:?}"));
        }
        if ty != TagType::Null && count == 0 {
            return Err("zero count".to_string());
        }

        let rest = &self.data[offset..];
        let fixed = |width: usize| take(rest, count, width);

        Ok(match ty {
            TagType::Null => TagData::Null,
            TagType::Char => TagData::Char(fixed(1)?.to_vec()),
            TagType::Int8 => TagData::Int8(fixed(1)?.to_vec()),
            TagType::Bin => TagData::Bin(fixed(1)?.to_vec()),
            TagType::Int16 => TagData::Int16(
                fixed(2)?
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect(),
            ),
            TagType::Int32 => TagData::Int32(
                fixed(4)?
                    .chunks_exact(4)
                    .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            TagType::Int64 => TagData::Int64(
                fixed(8)?
                    .chunks_exact(8)
                    .map(|c| {
                        let mut b = [0u8; 8];
                        b.copy_from_slice(c);
                        u64::from_be_bytes(b)
                    })
                    .collect(),
            ),
            TagType::String => {
                if count != 1 {
                    return Err(format!("string with count {count}"));
                }
                let mut strings = read_strings(rest, 1)?;
                TagData::String(strings.remove(0))
            }
            TagType::StringArray => TagData::StringArray(read_strings(rest, count)?),
            TagType::I18nString => TagData::I18nString(read_strings(rest, count)?),
        })
    }
}

fn take(rest: &[u8], count: usize, width: usize) -> Result<&[u8], String> {
    count
        .checked_mul(width)
        .and_then(|len| rest.get(..len))
        .ok_or_else(|| format!("{count} x {width} bytes exceed data"))
}

fn read_strings(mut data: &[u8], count: usize) -> Result<Vec<String>, String> {
    let mut out = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let end = data
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| "unterminated string".to_string())?;
        out.push(String::from_utf8_lossy(&data[..end]).into_owned());
        data = &data[end + 1..];
    }
    Ok(out)
}
