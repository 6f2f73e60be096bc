//! Character model
//!
//! Built once per load by the decoder and treated as read-only afterwards.
//! The machine and the loader share it through `Arc<Character>`.

mod model;

pub use model::{
    Action, ActionEffect, Animation, AnimationMode, AnimationRef, ImageDescriptor, Residency,
    Sequence, SequenceFrame, SequenceMode, State, StateImage, Transition, Trigger,
};

use alloc::collections::BTreeMap;
use alloc::string::String;

/// A fully decoded character
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    /// Directory name, unique per badge
    pub id: String,
    /// Display name
    pub name: String,
    /// Species shown under the name
    pub species: String,
    /// State entered after loading
    pub default_state: String,
    pub states: BTreeMap<String, State>,
    pub animations: BTreeMap<String, Animation>,
    /// Keyed by action id; iteration order defines action indices
    pub actions: BTreeMap<String, Action>,
}

impl Character {
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.get(name)
    }

    pub fn action(&self, id: &str) -> Option<&Action> {
        self.actions.get(id)
    }

    /// Action id at a stable index
    pub fn action_id_at(&self, index: usize) -> Option<&str> {
        self.actions.keys().nth(index).map(String::as_str)
    }

    /// States whose assets belong to `layer`
    pub fn states_in_layer(&self, layer: u16) -> impl Iterator<Item = (&str, &State)> {
        self.states
            .iter()
            .filter(move |(_, s)| s.layer == layer)
            .map(|(name, s)| (name.as_str(), s))
    }
}
