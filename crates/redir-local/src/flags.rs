//! Open-flag word carried by location requests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Requested open flags, as sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenFlags(u32);

// Only RDONLY and TRUNC drive decisions; the rest name the flag word.
#[allow(dead_code)]
impl OpenFlags {
    pub const RDONLY: Self = Self(0x0000_0000);
    pub const WRONLY: Self = Self(0x0000_0001);
    pub const RDWR: Self = Self(0x0000_0002);
    pub const CREAT: Self = Self(0x0000_0100);
    pub const TRUNC: Self = Self(0x0000_0200);
    pub const MULTIW: Self = Self(0x0000_0400);
    pub const MKPATH: Self = Self(0x0000_4000);
    pub const POSC: Self = Self(0x0010_0000);
}

impl OpenFlags {
    /// Largest flag word still treated as a simple open.
    ///
    /// The simple opens are read, write, read-write, create and truncate, and
    /// `TRUNC` is the highest of them, so any word above it carries at least
    /// one flag outside that set. Note that `CREAT | TRUNC` is above the bound.
    pub const SIMPLE_MAX: Self = Self::TRUNC;

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// A plain read with no modifiers.
    pub fn is_read_only(self) -> bool {
        self == Self::RDONLY
    }

    /// At or below `SIMPLE_MAX`: a read/write/create/truncate open.
    pub fn is_simple(self) -> bool {
        self.0 <= Self::SIMPLE_MAX.0
    }
}

impl std::ops::BitOr for OpenFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for OpenFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_opens_within_bound() {
        for flags in [
            OpenFlags::RDONLY,
            OpenFlags::WRONLY,
            OpenFlags::RDWR,
            OpenFlags::CREAT,
            OpenFlags::TRUNC,
            OpenFlags::WRONLY | OpenFlags::CREAT,
            OpenFlags::RDWR | OpenFlags::CREAT,
        ] {
            assert!(flags.is_simple(), "{flags} should be simple");
        }
    }

    #[test]
    fn test_complex_opens_exceed_bound() {
        assert!(!OpenFlags::MULTIW.is_simple());
        assert!(!OpenFlags::MKPATH.is_simple());
        assert!(!(OpenFlags::RDONLY | OpenFlags::POSC).is_simple());
        assert!(!(OpenFlags::CREAT | OpenFlags::TRUNC).is_simple());
    }

    #[test]
    fn test_only_bare_rdonly_is_read_only() {
        assert!(OpenFlags::RDONLY.is_read_only());
        assert!(!OpenFlags::RDWR.is_read_only());
        assert!(!OpenFlags::TRUNC.is_read_only());
    }

    #[test]
    fn test_wire_form_is_plain_integer() {
        let flags: OpenFlags = serde_json::from_str("257").unwrap();
        assert_eq!(flags, OpenFlags::WRONLY | OpenFlags::CREAT);
        assert_eq!(serde_json::to_string(&OpenFlags::TRUNC).unwrap(), "512");
        assert_eq!(OpenFlags::TRUNC.to_string(), "0x200");
    }
}
