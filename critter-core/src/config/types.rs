//! Engine configuration
//!
//! Timing knobs and the asset root. Stored as postcard-serialized binary
//! data when the `serde` feature is enabled.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current configuration layout version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum length of the characters root path
pub const MAX_ROOT_LEN: usize = 32;

/// Default arena size: room for a few full-screen RGB565 images
pub const DEFAULT_ARENA_SIZE: u32 = 512 * 1024;

/// Errors while restoring a configuration blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Blob could not be decoded
    Deserialize,
    /// Blob could not be encoded into the buffer
    Serialize,
    /// Blob was written by another layout version
    VersionMismatch(u8),
    /// Root path longer than [`MAX_ROOT_LEN`]
    RootTooLong,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Layout version for compatibility checks
    pub version: u8,
    /// Bytes reserved for the image arena
    pub arena_size: u32,
    /// State machine tick period
    pub tick_interval_ms: u32,
    /// Pause between frames while loading and minimum gap between animation frames
    pub frame_pacing_ms: u32,
    /// Poll period while waiting for the machine to become free
    pub wait_poll_ms: u32,
    /// How long a notice stays on screen
    pub notice_duration_ms: u32,
    /// Directory holding one subdirectory per character
    pub characters_root: String<MAX_ROOT_LEN>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut characters_root = String::new();
        // Fits MAX_ROOT_LEN
        let _ = characters_root.push_str("characters");
        Self {
            version: CONFIG_VERSION,
            arena_size: DEFAULT_ARENA_SIZE,
            tick_interval_ms: 100,
            frame_pacing_ms: 30,
            wait_poll_ms: 50,
            notice_duration_ms: 3000,
            characters_root,
        }
    }
}

impl EngineConfig {
    /// Replace the characters root
    pub fn set_root(&mut self, root: &str) -> Result<(), ConfigError> {
        let mut value = String::new();
        value.push_str(root).map_err(|_| ConfigError::RootTooLong)?;
        self.characters_root = value;
        Ok(())
    }

    /// Notice duration in microseconds
    pub fn notice_duration_us(&self) -> u64 {
        u64::from(self.notice_duration_ms) * 1000
    }

    /// Decode a stored blob, rejecting other layout versions
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        if config.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch(config.version));
        }
        Ok(config)
    }

    /// Encode into `buffer`, returning the used prefix
    #[cfg(feature = "serde")]
    pub fn to_bytes<'b>(&self, buffer: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        postcard::to_slice(self, buffer).map_err(|_| ConfigError::Serialize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.frame_pacing_ms, 30);
        assert_eq!(config.wait_poll_ms, 50);
        assert_eq!(config.notice_duration_us(), 3_000_000);
        assert_eq!(config.characters_root.as_str(), "characters");
    }

    #[test]
    fn test_root_too_long() {
        let mut config = EngineConfig::default();
        let long = "x".repeat(MAX_ROOT_LEN + 1);
        assert_eq!(config.set_root(&long), Err(ConfigError::RootTooLong));
        assert!(config.set_root("sd/chars").is_ok());
        assert_eq!(config.characters_root.as_str(), "sd/chars");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_roundtrip() {
        let config = EngineConfig {
            arena_size: 1024,
            ..Default::default()
        };
        let mut buffer = [0u8; 128];
        let bytes = config.to_bytes(&mut buffer).unwrap();
        assert_eq!(EngineConfig::from_bytes(bytes).unwrap(), config);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_version_mismatch() {
        let config = EngineConfig {
            version: CONFIG_VERSION + 1,
            ..Default::default()
        };
        let mut buffer = [0u8; 128];
        let bytes = config.to_bytes(&mut buffer).unwrap();
        assert_eq!(
            EngineConfig::from_bytes(bytes),
            Err(ConfigError::VersionMismatch(CONFIG_VERSION + 1))
        );
    }
}
