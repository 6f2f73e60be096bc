//! Binary asset records
//!
//! Every record is a fixed-size little-endian layout. String fields are
//! null padded and read up to the first null. Decoding is strict: a wrong
//! version, an unknown tag or a short record is an error, never a guess.

mod bytes;
mod records;

pub use records::{
    CharacterRecord, StateImageRecord, StateRecord, TransitionRecord, FORMAT_VERSION, NAME_LEN,
};

use alloc::vec::Vec;
use core::fmt;

/// Record types, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordKind {
    Character,
    State,
    Transition,
    Animation,
    SequenceFrame,
    Action,
    /// Raw animation frame pixels
    Frame,
}

/// Errors while decoding a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// Character written for another format version
    VersionMismatch { found: u16, expected: u16 },
    /// Enumeration tag outside the known range
    UnknownTag { record: RecordKind, tag: u8 },
    /// Fewer bytes than the fixed record size
    Truncated { record: RecordKind },
    /// String field is not valid UTF-8
    InvalidString { record: RecordKind },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::VersionMismatch { found, expected } => {
                write!(f, "format version {} (expected {})", found, expected)
            }
            FormatError::UnknownTag { record, tag } => {
                write!(f, "unknown tag {} in {:?} record", tag, record)
            }
            FormatError::Truncated { record } => write!(f, "truncated {:?} record", record),
            FormatError::InvalidString { record } => {
                write!(f, "invalid string in {:?} record", record)
            }
        }
    }
}

/// A fixed-size binary record
pub trait Record: Sized {
    /// Record type for error reporting
    const KIND: RecordKind;
    /// Encoded size in bytes
    const SIZE: usize;

    /// Decode from at least [`Self::SIZE`] bytes; trailing bytes are ignored
    fn decode(bytes: &[u8]) -> Result<Self, FormatError>;

    /// Encode to exactly [`Self::SIZE`] bytes
    fn to_bytes(&self) -> Vec<u8>;
}
