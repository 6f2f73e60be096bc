//! Asset storage trait
//!
//! Paths are `/`-separated and relative to the storage root. The engine only
//! needs whole-file reads, directory listing and zero-byte marker files.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::future::Future;

/// Errors from the storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// File or directory does not exist
    NotFound,
    /// Backend I/O failure
    Io,
    /// Destination buffer is smaller than the file
    BufferTooSmall,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageError::NotFound => "not found",
            StorageError::Io => "i/o error",
            StorageError::BufferTooSmall => "buffer too small",
        })
    }
}

/// Read access to character assets plus selection markers
pub trait AssetStorage {
    /// Size of a file in bytes, `None` if it does not exist
    fn file_size(&self, path: &str) -> impl Future<Output = Result<Option<usize>, StorageError>>;

    /// Read a file from its start into `buffer`
    ///
    /// Returns the number of bytes read, which is less than `buffer.len()`
    /// only when the file is shorter.
    fn read(
        &self,
        path: &str,
        buffer: &mut [u8],
    ) -> impl Future<Output = Result<usize, StorageError>>;

    /// Names of the direct subdirectories of `path`
    ///
    /// A missing directory lists as empty.
    fn list_dirs(&self, path: &str) -> impl Future<Output = Result<Vec<String>, StorageError>>;

    /// Create an empty file, truncating an existing one
    fn create_file(&self, path: &str) -> impl Future<Output = Result<(), StorageError>>;

    /// Remove a file; removing a missing file is not an error
    fn remove_file(&self, path: &str) -> impl Future<Output = Result<(), StorageError>>;
}
