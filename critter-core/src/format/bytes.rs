//! Little-endian field cursor

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use critter_protocol::{read_str, write_str};

use super::{FormatError, RecordKind};

pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    record: RecordKind,
}

impl<'a> Reader<'a> {
    /// Start reading a record of `size` bytes
    pub(crate) fn new(bytes: &'a [u8], record: RecordKind, size: usize) -> Result<Self, FormatError> {
        if bytes.len() < size {
            return Err(FormatError::Truncated { record });
        }
        Ok(Self {
            bytes: &bytes[..size],
            pos: 0,
            record,
        })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        let end = self.pos + n;
        let field = self
            .bytes
            .get(self.pos..end)
            .ok_or(FormatError::Truncated {
                record: self.record,
            })?;
        self.pos = end;
        Ok(field)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn bool(&mut self) -> Result<bool, FormatError> {
        Ok(self.u8()? != 0)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, FormatError> {
        self.array().map(u16::from_le_bytes)
    }

    pub(crate) fn u16_be(&mut self) -> Result<u16, FormatError> {
        self.array().map(u16::from_be_bytes)
    }

    pub(crate) fn u32(&mut self) -> Result<u32, FormatError> {
        self.array().map(u32::from_le_bytes)
    }

    pub(crate) fn i64(&mut self) -> Result<i64, FormatError> {
        self.array().map(i64::from_le_bytes)
    }

    pub(crate) fn string(&mut self, len: usize) -> Result<String, FormatError> {
        let record = self.record;
        read_str(self.take(len)?)
            .map(ToString::to_string)
            .map_err(|_| FormatError::InvalidString { record })
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), FormatError> {
        self.take(n).map(|_| ())
    }

    /// Error for an unexpected tag value in this record
    pub(crate) fn unknown_tag(&self, tag: u8) -> FormatError {
        FormatError::UnknownTag {
            record: self.record,
            tag,
        }
    }
}

pub(crate) struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    pub(crate) fn with_capacity(size: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(size),
        }
    }

    pub(crate) fn u8(&mut self, value: u8) -> &mut Self {
        self.bytes.push(value);
        self
    }

    pub(crate) fn bool(&mut self, value: bool) -> &mut Self {
        self.u8(value as u8)
    }

    pub(crate) fn u16(&mut self, value: u16) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn u16_be(&mut self, value: u16) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub(crate) fn u32(&mut self, value: u32) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn i64(&mut self, value: i64) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn string(&mut self, len: usize, value: &str) -> &mut Self {
        let start = self.bytes.len();
        self.bytes.resize(start + len, 0);
        write_str(&mut self.bytes[start..], value);
        self
    }

    /// Zero-fill up to `len` bytes in total
    pub(crate) fn pad_to(&mut self, len: usize) -> &mut Self {
        if self.bytes.len() < len {
            self.bytes.resize(len, 0);
        }
        self
    }

    pub(crate) fn finish(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.bytes)
    }
}
