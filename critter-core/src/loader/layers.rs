//! Layer resource manager
//!
//! States are grouped into numbered layers. Assets with `Residency::Layer`
//! stay in the arena while any state of their layer can be shown, so moving
//! between states of one layer never touches storage.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;

use embedded_hal_async::delay::DelayNs;

use super::{AssetSet, Loader, ProgressSink, ResidentAssets};
use crate::character::{Character, ImageDescriptor, Residency, StateImage};
use crate::error::LoadError;
use crate::traits::AssetStorage;

/// What has to change to make a layer resident
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerPlan {
    pub layer: u16,
    /// Images to load
    pub images: BTreeMap<String, ImageDescriptor>,
    /// Animations to load
    pub animations: BTreeSet<String>,
    /// Resident assets the layer no longer needs
    pub evict: ResidentAssets,
}

impl LayerPlan {
    /// Nothing to load
    pub fn is_loaded(&self) -> bool {
        self.images.is_empty() && self.animations.is_empty()
    }
}

/// Compare a layer's needs with what is resident
pub fn plan_layer(character: &Character, layer: u16, resident: &ResidentAssets) -> LayerPlan {
    let mut images = BTreeMap::new();
    let mut animations = BTreeSet::new();

    for (_, state) in character.states_in_layer(layer) {
        match &state.image {
            StateImage::Image(image) if image.residency == Residency::Layer => {
                images.insert(image.name.clone(), image.clone());
            }
            StateImage::Animation(reference) if reference.residency == Residency::Layer => {
                animations.insert(reference.name.clone());
            }
            _ => {}
        }
    }

    let evict = ResidentAssets {
        images: resident
            .images
            .iter()
            .filter(|name| !images.contains_key(*name))
            .cloned()
            .collect(),
        animations: resident
            .animations
            .difference(&animations)
            .cloned()
            .collect(),
    };
    images.retain(|name, _| !resident.images.contains(name));
    animations.retain(|name| !resident.animations.contains(name));

    LayerPlan {
        layer,
        images,
        animations,
        evict,
    }
}

impl<'a, S: AssetStorage> Loader<'a, S> {
    /// Load the assets a plan asks for
    ///
    /// Evictions are left to the caller, who applies them when the pending
    /// state switch flips.
    pub async fn load_layer<D: DelayNs, P: ProgressSink + ?Sized>(
        &self,
        character: &Character,
        plan: &LayerPlan,
        delay: &mut D,
        sink: &P,
    ) -> Result<AssetSet, LoadError> {
        info!(
            "layer {}: loading {} images, {} animations, evicting {}",
            plan.layer,
            plan.images.len(),
            plan.animations.len(),
            plan.evict.images.len() + plan.evict.animations.len()
        );
        self.load_assets(
            character,
            plan.images.clone(),
            plan.animations.clone(),
            delay,
            sink,
        )
        .await
    }
}
