//! Resident asset sets

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use crate::arena::ImageData;
use crate::character::ImageDescriptor;

/// Names of assets held by an [`AssetSet`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResidentAssets {
    pub images: BTreeSet<String>,
    pub animations: BTreeSet<String>,
}

impl ResidentAssets {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.animations.is_empty()
    }
}

/// Decoded assets resident in the arena
#[derive(Debug, Default)]
pub struct AssetSet {
    pub images: BTreeMap<String, (ImageDescriptor, ImageData)>,
    pub animations: BTreeMap<String, Vec<ImageData>>,
}

/// Assets loaded with the character, kept until the character changes
pub type PreloadedData = AssetSet;

/// Assets of the prepared layer
pub type LoadedLayerData = AssetSet;

impl AssetSet {
    pub fn image(&self, name: &str) -> Option<&ImageData> {
        self.images.get(name).map(|(_, data)| data)
    }

    pub fn animation(&self, name: &str) -> Option<&[ImageData]> {
        self.animations.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.animations.is_empty()
    }

    /// Names of everything in the set
    pub fn resident(&self) -> ResidentAssets {
        ResidentAssets {
            images: self.images.keys().cloned().collect(),
            animations: self.animations.keys().cloned().collect(),
        }
    }

    /// Take over every entry of `other`
    pub fn merge(&mut self, other: AssetSet) {
        self.images.extend(other.images);
        self.animations.extend(other.animations);
    }

    /// Remove the named entries and return them
    ///
    /// The caller decides where the returned handles are dropped, which is
    /// where their arena bytes become free.
    pub fn evict(&mut self, names: &ResidentAssets) -> AssetSet {
        let mut removed = AssetSet::default();
        for name in &names.images {
            if let Some(entry) = self.images.remove(name) {
                removed.images.insert(name.clone(), entry);
            }
        }
        for name in &names.animations {
            if let Some(frames) = self.animations.remove(name) {
                removed.animations.insert(name.clone(), frames);
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ImageArena;
    use crate::character::Residency;

    fn descriptor(name: &str) -> ImageDescriptor {
        ImageDescriptor {
            name: name.into(),
            width: 1,
            height: 1,
            has_alpha: false,
            upscale: false,
            residency: Residency::Layer,
        }
    }

    #[test]
    fn test_evict_releases_arena_bytes() {
        let arena = ImageArena::new(64);
        let mut set = AssetSet::default();
        for name in ["a", "b"] {
            let data = arena.allocate(32).unwrap().freeze();
            set.images.insert(name.into(), (descriptor(name), data));
        }
        assert_eq!(arena.largest_block_size(), 0);

        let mut names = ResidentAssets::default();
        names.images.insert("a".into());
        let removed = set.evict(&names);
        assert!(set.image("a").is_none());
        assert!(set.image("b").is_some());
        assert_eq!(arena.largest_block_size(), 0);

        drop(removed);
        assert_eq!(arena.largest_block_size(), 32);
    }

    #[test]
    fn test_merge_and_resident() {
        let arena = ImageArena::new(64);
        let mut set = AssetSet::default();
        let mut other = AssetSet::default();
        other
            .animations
            .insert("yawn".into(), vec![arena.allocate(8).unwrap().freeze()]);
        set.merge(other);

        let resident = set.resident();
        assert!(resident.animations.contains("yawn"));
        assert!(resident.images.is_empty());
        assert_eq!(set.animation("yawn").map(<[ImageData]>::len), Some(1));
    }
}
