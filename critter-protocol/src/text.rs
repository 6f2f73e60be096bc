//! Null-padded string fields

use core::str::Utf8Error;

/// Read a null-padded byte field as a string
///
/// Stops at the first null byte, or at the end of the field if none.
pub fn read_str(field: &[u8]) -> Result<&str, Utf8Error> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    core::str::from_utf8(&field[..end])
}

/// Write a string into a null-padded byte field
///
/// The field is cleared first. At most `field.len() - 1` bytes are copied so
/// the result always stays null terminated; truncation never splits a UTF-8
/// sequence. Returns the number of bytes copied.
pub fn write_str(field: &mut [u8], text: &str) -> usize {
    field.fill(0);
    if field.is_empty() {
        return 0;
    }

    let mut len = text.len().min(field.len() - 1);
    while !text.is_char_boundary(len) {
        len -= 1;
    }

    field[..len].copy_from_slice(&text.as_bytes()[..len]);
    len
}
