//! Byte ranges and verification flags

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Which regions of a package a digest or signature covers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SigRange: u8 {
        /// The immutable header
        const HEADER = 0b01;
        /// The payload following the header
        const PAYLOAD = 0b10;
    }
}

impl SigRange {
    /// Header and payload, consecutively
    pub const COMBINED: Self = Self::HEADER.union(Self::PAYLOAD);
}

bitflags::bitflags! {
    /// Verification classes to skip
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VerifyFlags: u32 {
        /// Skip everything that needs the payload
        const NEEDPAYLOAD = 1 << 1;
        const NOSHA1HEADER = 1 << 8;
        const NOSHA256HEADER = 1 << 9;
        const NODSAHEADER = 1 << 10;
        const NORSAHEADER = 1 << 11;
        const NOPAYLOAD = 1 << 16;
        const NOMD5 = 1 << 17;
        const NODSA = 1 << 18;
        const NORSA = 1 << 19;

        /// All digest checks
        const NODIGESTS = Self::NOSHA1HEADER.bits()
            | Self::NOSHA256HEADER.bits()
            | Self::NOPAYLOAD.bits()
            | Self::NOMD5.bits();
        /// All signature checks
        const NOSIGNATURES = Self::NODSAHEADER.bits()
            | Self::NORSAHEADER.bits()
            | Self::NODSA.bits()
            | Self::NORSA.bits();
    }
}

impl VerifyFlags {
    /// Build flags from the CLI style switches
    #[must_use]
    pub fn from_switches(nodigest: bool, nosignature: bool, nopayload: bool) -> Self {
        let mut flags = Self::empty();
        if nodigest {
            flags |= Self::NODIGESTS;
        }
        if nosignature {
            flags |= Self::NOSIGNATURES;
        }
        if nopayload {
            flags |= Self::NEEDPAYLOAD;
        }
        flags
    }
}

// Manual serde implementation for bitflags
impl Serialize for VerifyFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for VerifyFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Self::from_bits(bits).ok_or_else(|| {
            serde::de::Error::custom(format!("Invalid VerifyFlags bits: {bits}"))
        })
    }
}
