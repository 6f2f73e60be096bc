//! Character-lifetime preloading

use alloc::collections::{BTreeMap, BTreeSet};

use embedded_hal_async::delay::DelayNs;

use super::{Loader, PreloadedData, ProgressSink};
use crate::character::{Character, Residency, SequenceMode, StateImage};
use crate::error::LoadError;
use crate::traits::AssetStorage;

impl<'a, S: AssetStorage> Loader<'a, S> {
    /// Load every asset marked for preloading
    ///
    /// Covers preload images, every frame of preload sequences and preload
    /// animations. Shared assets are loaded once.
    pub async fn preload<D: DelayNs, P: ProgressSink + ?Sized>(
        &self,
        character: &Character,
        delay: &mut D,
        sink: &P,
    ) -> Result<PreloadedData, LoadError> {
        let mut images = BTreeMap::new();
        let mut animations = BTreeSet::new();

        for state in character.states.values() {
            match &state.image {
                StateImage::Image(image) if image.residency == Residency::Preload => {
                    images.insert(image.name.clone(), image.clone());
                }
                StateImage::Sequence(sequence) if sequence.mode == SequenceMode::Preload => {
                    for frame in &sequence.frames {
                        images.insert(frame.image.name.clone(), frame.image.clone());
                    }
                }
                StateImage::Animation(reference) if reference.residency == Residency::Preload => {
                    animations.insert(reference.name.clone());
                }
                _ => {}
            }
        }

        info!(
            "preloading {} images, {} animations",
            images.len(),
            animations.len()
        );
        self.load_assets(character, images, animations, delay, sink)
            .await
    }
}
