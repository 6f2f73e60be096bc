//! Configuration loading
//!
//! Loads engine configuration from storage. A TOML document is tried first,
//! then a postcard blob; with neither present the built-in defaults apply.
//!
//! ```toml
//! [engine]
//! arena_size = 262144
//! tick_interval_ms = 100
//! characters_root = "characters"
//! ```
//!
//! Keys left out of the document keep their default value.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::str;

use serde::Deserialize;

use critter_core::config::{ConfigError as LayoutError, EngineConfig};
use critter_core::traits::{AssetStorage, StorageError};

/// TOML configuration path on storage
pub const CONFIG_TOML_PATH: &str = "critter.toml";

/// Binary configuration path on storage
pub const CONFIG_BIN_PATH: &str = "critter.bin";

/// Largest configuration file accepted
const MAX_CONFIG_SIZE: usize = 4096;

/// Configuration loading errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Storage operation failed
    Storage(StorageError),
    /// TOML parsing failed
    TomlParse,
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// File larger than the accepted maximum
    TooLarge,
    /// Values rejected by the engine configuration
    Invalid(LayoutError),
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        ConfigError::Storage(e)
    }
}

impl From<LayoutError> for ConfigError {
    fn from(e: LayoutError) -> Self {
        ConfigError::Invalid(e)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    engine: EngineSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EngineSection {
    arena_size: Option<u32>,
    tick_interval_ms: Option<u32>,
    frame_pacing_ms: Option<u32>,
    wait_poll_ms: Option<u32>,
    notice_duration_ms: Option<u32>,
    characters_root: Option<String>,
}

/// Parse a TOML document into an engine configuration
pub fn parse_config(input: &str) -> Result<EngineConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(input).map_err(|_| ConfigError::TomlParse)?;
    let section = file.engine;
    let mut config = EngineConfig::default();

    if let Some(value) = section.arena_size {
        config.arena_size = value;
    }
    if let Some(value) = section.tick_interval_ms {
        config.tick_interval_ms = value.max(1);
    }
    if let Some(value) = section.frame_pacing_ms {
        config.frame_pacing_ms = value;
    }
    if let Some(value) = section.wait_poll_ms {
        config.wait_poll_ms = value.max(1);
    }
    if let Some(value) = section.notice_duration_ms {
        config.notice_duration_ms = value;
    }
    if let Some(root) = section.characters_root {
        config.set_root(&root)?;
    }

    Ok(config)
}

/// Load the configuration from storage
///
/// A malformed TOML file falls through to the binary blob; only a malformed
/// blob is reported as an error.
pub async fn load_config<S: AssetStorage>(storage: &S) -> Result<EngineConfig, ConfigError> {
    info!("loading configuration");

    match load_toml(storage).await {
        Ok(config) => {
            info!("loaded configuration from TOML");
            return Ok(config);
        }
        Err(ConfigError::Storage(StorageError::NotFound)) => {
            debug!("no TOML config found, trying binary format");
        }
        Err(e) => {
            warn!("failed to load TOML config: {}, trying binary", e);
        }
    }

    match read_file(storage, CONFIG_BIN_PATH).await {
        Ok(bytes) => {
            let config = EngineConfig::from_bytes(&bytes)?;
            info!("loaded binary configuration");
            Ok(config)
        }
        Err(ConfigError::Storage(StorageError::NotFound)) => {
            info!("no configuration found, using defaults");
            Ok(EngineConfig::default())
        }
        Err(e) => Err(e),
    }
}

async fn load_toml<S: AssetStorage>(storage: &S) -> Result<EngineConfig, ConfigError> {
    let bytes = read_file(storage, CONFIG_TOML_PATH).await?;
    let text = str::from_utf8(&bytes).map_err(|_| ConfigError::InvalidUtf8)?;
    parse_config(text)
}

async fn read_file<S: AssetStorage>(storage: &S, path: &str) -> Result<Vec<u8>, ConfigError> {
    let size = storage
        .file_size(path)
        .await?
        .ok_or(ConfigError::Storage(StorageError::NotFound))?;
    if size > MAX_CONFIG_SIZE {
        return Err(ConfigError::TooLarge);
    }

    let mut buffer = vec![0u8; size];
    let len = storage.read(path, &mut buffer).await?;
    buffer.truncate(len);
    debug!("read {} bytes from {}", len, path);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::DirStorage;
    use critter_core::config::DEFAULT_ARENA_SIZE;
    use embassy_futures::block_on;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(parse_config("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = parse_config(
            r#"
            # smaller arena for the dev board
            [engine]
            arena_size = 65536
            characters_root = "sd/chars"
            "#,
        )
        .unwrap();

        assert_eq!(config.arena_size, 65536);
        assert_eq!(config.characters_root.as_str(), "sd/chars");
        assert_eq!(config.tick_interval_ms, 100);
        assert_eq!(config.notice_duration_ms, 3000);
    }

    #[test]
    fn test_bad_values() {
        assert_eq!(
            parse_config("[engine]\narena_size = \"big\""),
            Err(ConfigError::TomlParse)
        );
        assert_eq!(
            parse_config("[engine]\ncharacters_root = \"this/path/is/much/too/long/for/the/root\""),
            Err(ConfigError::Invalid(LayoutError::RootTooLong))
        );
    }

    #[test]
    fn test_load_prefers_toml_then_binary_then_defaults() {
        let storage = DirStorage::temporary("config");

        let config = block_on(load_config(&storage)).unwrap();
        assert_eq!(config.arena_size, DEFAULT_ARENA_SIZE);

        let blob = EngineConfig {
            arena_size: 2048,
            ..Default::default()
        };
        let mut buffer = [0u8; 128];
        storage.write(CONFIG_BIN_PATH, blob.to_bytes(&mut buffer).unwrap()).unwrap();
        assert_eq!(block_on(load_config(&storage)).unwrap().arena_size, 2048);

        storage.write(CONFIG_TOML_PATH, b"[engine]\narena_size = 4096\n").unwrap();
        assert_eq!(block_on(load_config(&storage)).unwrap().arena_size, 4096);

        // Broken TOML falls back to the blob
        storage.write(CONFIG_TOML_PATH, b"[engine\n").unwrap();
        assert_eq!(block_on(load_config(&storage)).unwrap().arena_size, 2048);
    }
}
