//! Directory convention for character assets

use alloc::format;
use alloc::string::String;

/// Paths inside one character's directory
#[derive(Debug, Clone, Copy)]
pub struct CharacterPaths<'a> {
    root: &'a str,
    id: &'a str,
}

impl<'a> CharacterPaths<'a> {
    pub fn new(root: &'a str, id: &'a str) -> Self {
        Self { root, id }
    }

    pub fn dir(&self) -> String {
        format!("{}/{}", self.root, self.id)
    }

    pub fn character(&self) -> String {
        format!("{}/{}/character.bin", self.root, self.id)
    }

    /// Zero-byte marker for the selected character
    pub fn selected_marker(&self) -> String {
        format!("{}/{}/selected.lock", self.root, self.id)
    }

    pub fn states(&self) -> String {
        format!("{}/{}/states", self.root, self.id)
    }

    pub fn state(&self, state: &str) -> String {
        format!("{}/{}/states/{}/state.bin", self.root, self.id, state)
    }

    /// Sequence frame record, 0-based
    pub fn sequence_frame(&self, state: &str, index: usize) -> String {
        format!("{}/{}/states/{}/frames/{}.bin", self.root, self.id, state, index)
    }

    pub fn transitions(&self, state: &str) -> String {
        format!("{}/{}/states/{}/transitions", self.root, self.id, state)
    }

    pub fn transition(&self, state: &str, target: &str) -> String {
        format!(
            "{}/{}/states/{}/transitions/{}/transition.bin",
            self.root, self.id, state, target
        )
    }

    pub fn animations(&self) -> String {
        format!("{}/{}/animations", self.root, self.id)
    }

    pub fn animation(&self, name: &str) -> String {
        format!("{}/{}/animations/{}/animation.bin", self.root, self.id, name)
    }

    /// Raw RGB565 animation frame, 1-based
    pub fn animation_frame(&self, name: &str, index: u32) -> String {
        format!("{}/{}/animations/{}/frames/{}.bin", self.root, self.id, name, index)
    }

    pub fn actions(&self) -> String {
        format!("{}/{}/actions", self.root, self.id)
    }

    pub fn action(&self, id: &str) -> String {
        format!("{}/{}/actions/{}/action.bin", self.root, self.id, id)
    }

    /// Raw image bytes
    pub fn image(&self, name: &str) -> String {
        format!("{}/{}/images/{}.bin", self.root, self.id, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let p = CharacterPaths::new("characters", "fox");
        assert_eq!(p.character(), "characters/fox/character.bin");
        assert_eq!(p.selected_marker(), "characters/fox/selected.lock");
        assert_eq!(p.state("idle"), "characters/fox/states/idle/state.bin");
        assert_eq!(
            p.sequence_frame("idle", 0),
            "characters/fox/states/idle/frames/0.bin"
        );
        assert_eq!(
            p.transition("idle", "sleep"),
            "characters/fox/states/idle/transitions/sleep/transition.bin"
        );
        assert_eq!(
            p.animation_frame("yawn", 1),
            "characters/fox/animations/yawn/frames/1.bin"
        );
        assert_eq!(p.action("wave"), "characters/fox/actions/wave/action.bin");
        assert_eq!(p.image("sit"), "characters/fox/images/sit.bin");
    }
}
