//! Character library
//!
//! Characters live in one directory each under a configurable root. The
//! selected character carries a zero-byte `selected.lock` marker.

mod decoder;
mod paths;

pub use decoder::{decode_character, read_record};
pub use paths::CharacterPaths;

use alloc::string::String;
use alloc::vec::Vec;

use crate::character::Character;
use crate::error::LoadError;
use crate::traits::AssetStorage;

/// Enumerates, selects and decodes characters on storage
pub struct CharacterLibrary<'a, S> {
    storage: &'a S,
    root: &'a str,
}

impl<'a, S: AssetStorage> CharacterLibrary<'a, S> {
    pub fn new(storage: &'a S, root: &'a str) -> Self {
        Self { storage, root }
    }

    /// Character ids in stable (sorted) order
    pub async fn list_characters(&self) -> Result<Vec<String>, LoadError> {
        let mut ids = self.storage.list_dirs(self.root).await?;
        ids.sort();
        Ok(ids)
    }

    /// Id of the character carrying the selection marker, if any
    pub async fn selected_character(&self) -> Result<Option<String>, LoadError> {
        for id in self.list_characters().await? {
            let marker = CharacterPaths::new(self.root, &id).selected_marker();
            if self.storage.file_size(&marker).await?.is_some() {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Move the selection marker to `id`
    ///
    /// Old markers are removed before the new one is created, so at most one
    /// character is ever marked.
    pub async fn select_character(&self, id: &str) -> Result<(), LoadError> {
        let ids = self.list_characters().await?;
        if !ids.iter().any(|known| known == id) {
            return Err(LoadError::NotFound);
        }

        for other in ids.iter().filter(|known| known.as_str() != id) {
            let marker = CharacterPaths::new(self.root, other).selected_marker();
            self.storage.remove_file(&marker).await?;
        }
        let marker = CharacterPaths::new(self.root, id).selected_marker();
        self.storage.create_file(&marker).await?;
        info!("selected character {}", id);
        Ok(())
    }

    /// The selected character, or the first one when nothing is marked
    pub async fn selected_or_first(&self) -> Result<Option<String>, LoadError> {
        if let Some(id) = self.selected_character().await? {
            return Ok(Some(id));
        }
        Ok(self.list_characters().await?.into_iter().next())
    }

    /// Decode the character `id`
    pub async fn load(&self, id: &str) -> Result<Character, LoadError> {
        decode_character(self.storage, self.root, id).await
    }

    /// Decode whichever character [`Self::selected_or_first`] picks
    pub async fn load_selected_or_first(&self) -> Result<Character, LoadError> {
        match self.selected_or_first().await? {
            Some(id) => self.load(&id).await,
            None => Err(LoadError::NotFound),
        }
    }
}
