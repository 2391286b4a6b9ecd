//! Decoded header contents

/// On-disk type of a header entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TagType {
    Null = 0,
    Char = 1,
    Int8 = 2,
    Int16 = 3,
    Int32 = 4,
    Int64 = 5,
    String = 6,
    Bin = 7,
    StringArray = 8,
    I18nString = 9,
}

impl TagType {
    #[must_use]
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::Null,
            1 => Self::Char,
            2 => Self::Int8,
            3 => Self::Int16,
            4 => Self::Int32,
            5 => Self::Int64,
            6 => Self::String,
            7 => Self::Bin,
            8 => Self::StringArray,
            9 => Self::I18nString,
            _ => return None,
        })
    }

    /// Required alignment of the entry's data
    #[must_use]
    pub fn alignment(self) -> usize {
        match self {
            Self::Int16 => 2,
            Self::Int32 => 4,
            Self::Int64 => 8,
            _ => 1,
        }
    }
}

/// Value of one header entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagData {
    Null,
    Char(Vec<u8>),
    Int8(Vec<u8>),
    Int16(Vec<u16>),
    Int32(Vec<u32>),
    Int64(Vec<u64>),
    String(String),
    Bin(Vec<u8>),
    StringArray(Vec<String>),
    I18nString(Vec<String>),
}

impl TagData {
    #[must_use]
    pub fn tag_type(&self) -> TagType {
        match self {
            Self::Null => TagType::Null,
            Self::Char(_) => TagType::Char,
            Self::Int8(_) => TagType::Int8,
            Self::Int16(_) => TagType::Int16,
            Self::Int32(_) => TagType::Int32,
            Self::Int64(_) => TagType::Int64,
            Self::String(_) => TagType::String,
            Self::Bin(_) => TagType::Bin,
            Self::StringArray(_) => TagType::StringArray,
            Self::I18nString(_) => TagType::I18nString,
        }
    }

    /// Element count as stored in the index
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::String(_) => 1,
            Self::Char(v) | Self::Int8(v) | Self::Bin(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::StringArray(v) | Self::I18nString(v) => v.len(),
        }
    }

    /// First string of a string-like entry
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::StringArray(v) | Self::I18nString(v) => v.first().map(String::as_str),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bin(v) | Self::Char(v) | Self::Int8(v) => Some(v),
            _ => None,
        }
    }

    /// First integer of an integer entry
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int8(v) | Self::Char(v) => v.first().map(|&x| u64::from(x)),
            Self::Int16(v) => v.first().map(|&x| u64::from(x)),
            Self::Int32(v) => v.first().map(|&x| u64::from(x)),
            Self::Int64(v) => v.first().copied(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub tag: u32,
    pub data: TagData,
}

/// A decoded header: entries in storage order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    region: Option<u32>,
    entries: Vec<HeaderEntry>,
}

impl Header {
    pub(crate) fn from_parts(region: Option<u32>, entries: Vec<HeaderEntry>) -> Self {
        Self { region, entries }
    }

    /// Region tag announced by the first entry, if any
    #[must_use]
    pub fn region(&self) -> Option<u32> {
        self.region
    }

    /// Entries in storage order, region markers excluded
    pub fn entries(&self) -> std::slice::Iter<'_, HeaderEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, tag: u32) -> Option<&TagData> {
        self.entries.iter().find(|e| e.tag == tag).map(|e| &e.data)
    }

    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.entries.iter().any(|e| e.tag == tag)
    }

    /// Copy the listed tags from `other` where this header lacks them
    ///
    /// Returns the number of entries copied.
    pub fn copy_tags(&mut self, other: &Header, tags: &[u32]) -> usize {
        let mut copied = 0;
        for &tag in tags {
            if self.contains(tag) {
                continue;
            }
            if let Some(data) = other.get(tag) {
                self.entries.push(HeaderEntry {
                    tag,
                    data: data.clone(),
                });
                copied += 1;
            }
        }
        copied
    }
}

impl<'a> IntoIterator for &'a Header {
    type Item = &'a HeaderEntry;
    type IntoIter = std::slice::Iter<'a, HeaderEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
