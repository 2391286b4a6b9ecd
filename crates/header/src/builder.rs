//! Header serialization

use crate::blob::HEADER_MAGIC;
use crate::header::{HeaderEntry, TagData, TagType};
use pkgsig_types::tags;

/// Assembles a header blob from entries, in insertion order
#[derive(Debug, Clone, Default)]
pub struct HeaderBuilder {
    entries: Vec<HeaderEntry>,
}

impl HeaderBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    #[must_use]
    pub fn with(mut self, tag: u32, data: TagData) -> Self {
        self.push(tag, data);
        self
    }

    pub fn push(&mut self, tag: u32, data: TagData) {
        self.entries.push(HeaderEntry { tag, data });
    }

    /// Serialize, optionally with a leading region marker
    #[must_use]
    pub fn build(&self, region_tag: Option<u32>) -> Vec<u8> {
        let mut index: Vec<(u32, u32, i32, u32)> = Vec::with_capacity(self.entries.len() + 1);
        let mut data: Vec<u8> = Vec::new();

        for entry in &self.entries {
            let ty = entry.data.tag_type();
            while data.len() % ty.alignment() != 0 {
                data.push(0);
            }
            let offset = i32::try_from(data.len()).unwrap_or(i32::MAX);
            encode(&entry.data, &mut data);
            let count = u32::try_from(entry.data.count()).unwrap_or(u32::MAX);
            index.push((entry.tag, ty as u32, offset, count));
        }

        if let Some(region) = region_tag {
            let il = i32::try_from(index.len() + 1).unwrap_or(i32::MAX);
            let trailer_offset = i32::try_from(data.len()).unwrap_or(i32::MAX);
            data.extend_from_slice(&region.to_be_bytes());
            data.extend_from_slice(&(TagType::Bin as u32).to_be_bytes());
            data.extend_from_slice(&(-(il * 16)).to_be_bytes());
            data.extend_from_slice(&16u32.to_be_bytes());
            index.insert(0, (region, TagType::Bin as u32, trailer_offset, 16));
        }

        let il = u32::try_from(index.len()).unwrap_or(u32::MAX);
        let dl = u32::try_from(data.len()).unwrap_or(u32::MAX);
        let mut out = Vec::with_capacity(16 + index.len() * 16 + data.len());
        out.extend_from_slice(&HEADER_MAGIC);
        out.extend_from_slice(&il.to_be_bytes());
        out.extend_from_slice(&dl.to_be_bytes());
        for (tag, ty, offset, count) in index {
            out.extend_from_slice(&tag.to_be_bytes());
            out.extend_from_slice(&ty.to_be_bytes());
            out.extend_from_slice(&offset.to_be_bytes());
            out.extend_from_slice(&count.to_be_bytes());
        }
        out.extend_from_slice(&data);
        out
    }

    /// Serialize as a signature header, padded to eight bytes
    #[must_use]
    pub fn build_signature(&self) -> Vec<u8> {
        let mut out = self.build(Some(tags::HEADER_SIGNATURES));
        while out.len() % 8 != 0 {
            out.push(0);
        }
        out
    }

    /// Serialize as an immutable header
    #[must_use]
    pub fn build_immutable(&self) -> Vec<u8> {
        self.build(Some(tags::HEADER_IMMUTABLE))
    }
}

fn encode(value: &TagData, out: &mut Vec<u8>) {
    match value {
        TagData::Null => {}
        TagData::Char(v) | TagData::Int8(v) | TagData::Bin(v) => out.extend_from_slice(v),
        TagData::Int16(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
        TagData::Int32(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
        TagData::Int64(v) => v.iter().for_each(|x| out.extend_from_slice(&x.to_be_bytes())),
        TagData::String(s) => {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        TagData::StringArray(v) | TagData::I18nString(v) => {
            for s in v {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
        }
    }
}
