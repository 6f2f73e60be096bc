//! Directory-backed storage for host simulation
//!
//! Serves the same `/`-separated layout the badge reads from its SD card,
//! rooted at a host directory.

use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use critter_core::traits::{AssetStorage, StorageError};

/// Asset storage on the host filesystem
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        full.extend(path.split('/').filter(|part| !part.is_empty()));
        full
    }

    /// Write a file, creating parent directories as needed
    pub fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }
        fs::write(&full, bytes).map_err(map_io)
    }

    /// Fresh empty directory under the system temp dir
    #[cfg(test)]
    pub(crate) fn temporary(name: &str) -> Self {
        use core::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(std::format!(
            "critter-{}-{}-{}",
            name,
            std::process::id(),
            unique
        ));
        let _ = fs::remove_dir_all(&root);
        let _ = fs::create_dir_all(&root);
        Self::new(root)
    }
}

fn map_io(e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        _ => StorageError::Io,
    }
}

impl AssetStorage for DirStorage {
    async fn file_size(&self, path: &str) -> Result<Option<usize>, StorageError> {
        match fs::metadata(self.resolve(path)) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len() as usize)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(e)),
        }
    }

    async fn read(&self, path: &str, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let mut file = fs::File::open(self.resolve(path)).map_err(map_io)?;
        let mut filled = 0;
        while filled < buffer.len() {
            match file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(map_io(e)),
            }
        }
        Ok(filled)
    }

    async fn list_dirs(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(self.resolve(path)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(map_io(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(map_io)?;
            if entry.file_type().map_err(map_io)?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.into());
                }
            }
        }
        Ok(names)
    }

    async fn create_file(&self, path: &str) -> Result<(), StorageError> {
        fs::File::create(self.resolve(path))
            .map(drop)
            .map_err(map_io)
    }

    async fn remove_file(&self, path: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.resolve(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn test_missing_paths() {
        let storage = DirStorage::temporary("missing");
        assert_eq!(block_on(storage.file_size("nope.bin")), Ok(None));
        assert_eq!(block_on(storage.list_dirs("nope")), Ok(Vec::new()));
        assert_eq!(block_on(storage.remove_file("nope.bin")), Ok(()));

        let mut buffer = [0u8; 4];
        assert_eq!(
            block_on(storage.read("nope.bin", &mut buffer)),
            Err(StorageError::NotFound)
        );
    }

    #[test]
    fn test_read_short_file() {
        let storage = DirStorage::temporary("short");
        storage.write("characters/fox/images/idle.bin", &[1, 2, 3]).unwrap();

        let mut buffer = [0u8; 8];
        let read = block_on(storage.read("characters/fox/images/idle.bin", &mut buffer)).unwrap();
        assert_eq!(read, 3);
        assert_eq!(&buffer[..3], &[1, 2, 3]);
        assert_eq!(
            block_on(storage.file_size("characters/fox/images/idle.bin")),
            Ok(Some(3))
        );
    }

    #[test]
    fn test_list_dirs_skips_files() {
        let storage = DirStorage::temporary("list");
        storage.write("characters/fox/character.bin", &[0]).unwrap();
        storage.write("characters/owl/character.bin", &[0]).unwrap();
        storage.write("characters/readme.txt", b"hi").unwrap();

        let mut dirs = block_on(storage.list_dirs("characters")).unwrap();
        dirs.sort();
        assert_eq!(dirs, vec!["fox", "owl"]);
    }

    #[test]
    fn test_marker_files() {
        let storage = DirStorage::temporary("marker");
        storage.write("characters/fox/character.bin", &[0]).unwrap();

        block_on(storage.create_file("characters/fox/selected.lock")).unwrap();
        assert_eq!(
            block_on(storage.file_size("characters/fox/selected.lock")),
            Ok(Some(0))
        );
        block_on(storage.remove_file("characters/fox/selected.lock")).unwrap();
        assert_eq!(
            block_on(storage.file_size("characters/fox/selected.lock")),
            Ok(None)
        );
    }
}
