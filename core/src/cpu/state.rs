//! Register values exposed through the generic processor interface.

use thiserror::Error;

/// A register value tagged with its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterValue {
    U8(u8),
    U16(u16),
}

impl RegisterValue {
    pub fn get(self) -> u32 {
        match self {
            Self::U8(v) => v as u32,
            Self::U16(v) => v as u32,
        }
    }

    /// Number of hex digits needed to show the full width.
    pub fn hex_digits(self) -> usize {
        match self {
            Self::U8(_) => 2,
            Self::U16(_) => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("no such register: {0}")]
    UnknownRegister(String),
    #[error("no such flag: {0}")]
    UnknownFlag(String),
}
