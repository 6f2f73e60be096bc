//! Asset loading
//!
//! Everything that moves bytes from storage into the arena: character
//! preloading, the layer resource manager and the cooker that prepares a
//! state's visuals before the machine switches to it. Loading never touches
//! machine state; results are handed back whole and published by the caller.

mod assets;
mod cooker;
mod job;
mod layers;
mod preload;

pub use assets::{AssetSet, LoadedLayerData, PreloadedData, ResidentAssets};
pub use cooker::{needs_cooking, CookedSet, PingPong};
pub use job::{Job, JobOutcome};
pub use layers::{plan_layer, LayerPlan};

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use embedded_hal_async::delay::DelayNs;

use crate::arena::{ImageArena, ImageBuffer, ImageData};
use crate::character::{Animation, Character, ImageDescriptor};
use crate::error::LoadError;
use crate::format::{FormatError, RecordKind};
use crate::library::CharacterPaths;
use crate::traits::{AssetStorage, StorageError};

/// Receives loading progress
pub trait ProgressSink {
    /// `current` of `total` units are done
    fn report(&self, current: u32, total: u32);
}

impl ProgressSink for () {
    fn report(&self, _current: u32, _total: u32) {}
}

/// Counts completed units against a total
pub(crate) struct Progress<'p, P: ProgressSink + ?Sized> {
    sink: &'p P,
    current: u32,
    total: u32,
}

impl<'p, P: ProgressSink + ?Sized> Progress<'p, P> {
    pub(crate) fn new(sink: &'p P, total: u32) -> Self {
        sink.report(0, total);
        Self {
            sink,
            current: 0,
            total,
        }
    }

    pub(crate) fn step(&mut self) {
        self.current += 1;
        self.sink.report(self.current, self.total);
    }
}

/// Loads one character's assets into the arena
pub struct Loader<'a, S> {
    arena: &'a ImageArena,
    storage: &'a S,
    paths: CharacterPaths<'a>,
    pacing_ms: u32,
}

impl<'a, S: AssetStorage> Loader<'a, S> {
    pub fn new(
        arena: &'a ImageArena,
        storage: &'a S,
        paths: CharacterPaths<'a>,
        pacing_ms: u32,
    ) -> Self {
        Self {
            arena,
            storage,
            paths,
            pacing_ms,
        }
    }

    pub fn paths(&self) -> &CharacterPaths<'a> {
        &self.paths
    }

    /// Allocate `size` bytes, failing fast when no gap is large enough
    pub fn reserve(&self, size: usize) -> Result<ImageBuffer, LoadError> {
        let largest = self.arena.largest_block_size();
        if largest < size {
            warn!("need {} bytes, largest gap is {}", size, largest);
            return Err(LoadError::OutOfMemory);
        }
        self.arena.allocate(size).ok_or(LoadError::OutOfMemory)
    }

    async fn existing_size(&self, path: &str) -> Result<usize, LoadError> {
        match self.storage.file_size(path).await? {
            Some(0) | None => {
                warn!("missing asset {}", path);
                Err(LoadError::NotFound)
            }
            Some(size) => Ok(size),
        }
    }

    /// Size of an image file
    pub async fn image_size(&self, image: &ImageDescriptor) -> Result<usize, LoadError> {
        self.existing_size(&self.paths.image(&image.name)).await
    }

    /// Load a still image into a fresh allocation
    pub async fn load_image(&self, image: &ImageDescriptor) -> Result<ImageData, LoadError> {
        let path = self.paths.image(&image.name);
        let size = self.existing_size(&path).await?;
        let mut buffer = self.reserve(size)?;
        self.storage.read(&path, buffer.as_mut_slice()).await?;
        Ok(buffer.freeze())
    }

    /// Load a still image into an existing buffer, returning its length
    pub async fn read_image_into(
        &self,
        image: &ImageDescriptor,
        buffer: &mut ImageBuffer,
    ) -> Result<usize, LoadError> {
        let path = self.paths.image(&image.name);
        let size = self.existing_size(&path).await?;
        if size > buffer.len() {
            return Err(LoadError::Storage(StorageError::BufferTooSmall));
        }
        let read = self
            .storage
            .read(&path, &mut buffer.as_mut_slice()[..size])
            .await?;
        Ok(read)
    }

    /// Read animation frame `index` (1-based) into `buffer`
    pub async fn read_frame_into(
        &self,
        name: &str,
        index: u32,
        buffer: &mut [u8],
    ) -> Result<(), LoadError> {
        let read = self
            .storage
            .read(&self.paths.animation_frame(name, index), buffer)
            .await?;
        if read < buffer.len() {
            return Err(LoadError::Incompatible(FormatError::Truncated {
                record: RecordKind::Frame,
            }));
        }
        Ok(())
    }

    /// Load every frame of an animation, pausing between frames
    pub(crate) async fn load_animation<D: DelayNs, P: ProgressSink + ?Sized>(
        &self,
        name: &str,
        animation: &Animation,
        delay: &mut D,
        progress: &mut Progress<'_, P>,
    ) -> Result<Vec<ImageData>, LoadError> {
        let size = animation.frame_bytes().ok_or(LoadError::OutOfMemory)?;
        let mut frames = Vec::new();
        for index in 1..=animation.frame_count {
            let mut buffer = self.reserve(size)?;
            self.read_frame_into(name, index, buffer.as_mut_slice())
                .await?;
            frames.push(buffer.freeze());
            progress.step();
            if index < animation.frame_count {
                delay.delay_ms(self.pacing_ms).await;
            }
        }
        debug!("loaded {} frames of {}", frames.len(), name);
        Ok(frames)
    }

    /// Load a batch of images and animations into a new set
    ///
    /// All or nothing: on failure the partial set is dropped here.
    pub(crate) async fn load_assets<D: DelayNs, P: ProgressSink + ?Sized>(
        &self,
        character: &Character,
        images: BTreeMap<String, ImageDescriptor>,
        animations: BTreeSet<String>,
        delay: &mut D,
        sink: &P,
    ) -> Result<AssetSet, LoadError> {
        let mut total = images.len() as u32;
        for name in &animations {
            let animation = character.animation(name).ok_or(LoadError::NotFound)?;
            total = total.saturating_add(animation.frame_count);
        }

        let mut progress = Progress::new(sink, total);
        let mut set = AssetSet::default();
        for (name, descriptor) in images {
            let data = self.load_image(&descriptor).await?;
            set.images.insert(name, (descriptor, data));
            progress.step();
            delay.delay_ms(self.pacing_ms).await;
        }
        for name in animations {
            let animation = character.animation(&name).ok_or(LoadError::NotFound)?;
            let frames = self
                .load_animation(&name, animation, delay, &mut progress)
                .await?;
            set.animations.insert(name, frames);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{AnimationMode, Residency};
    use crate::testing::{FakeClock, FakeDelay, Fixture, MemStorage};
    use crate::format::Record;
    use crate::traits::Clock;
    use core::cell::RefCell;
    use embassy_futures::block_on;

    struct Recorder(RefCell<Vec<(u32, u32)>>);

    impl ProgressSink for Recorder {
        fn report(&self, current: u32, total: u32) {
            self.0.borrow_mut().push((current, total));
        }
    }

    fn descriptor(name: &str) -> ImageDescriptor {
        ImageDescriptor {
            name: name.into(),
            width: 4,
            height: 4,
            has_alpha: false,
            upscale: false,
            residency: Residency::OnDemand,
        }
    }

    fn animation(frames: u32) -> Animation {
        Animation {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
            frame_count: frames,
            interval_us: 50_000,
            clear_screen: false,
            background_color: 0,
            mode: AnimationMode::FromMemory,
            upscale: false,
        }
    }

    #[test]
    fn test_load_image() {
        let storage = MemStorage::new();
        Fixture::new(&storage, "fox").image("sit", 32, 7);
        let arena = ImageArena::new(64);
        let loader = Loader::new(&arena, &storage, CharacterPaths::new("characters", "fox"), 30);

        let data = block_on(loader.load_image(&descriptor("sit"))).unwrap();
        assert_eq!(data.len(), 32);
        assert!(data.as_bytes().iter().all(|&b| b == 7));
    }

    #[test]
    fn test_load_image_fails_fast_without_room() {
        let storage = MemStorage::new();
        Fixture::new(&storage, "fox").image("big", 100, 1);
        let arena = ImageArena::new(64);
        let loader = Loader::new(&arena, &storage, CharacterPaths::new("characters", "fox"), 30);

        let result = block_on(loader.load_image(&descriptor("big")));
        assert_eq!(result.unwrap_err(), LoadError::OutOfMemory);
        // Size check happens before any read
        assert_eq!(storage.reads(), 0);
    }

    #[test]
    fn test_missing_image() {
        let storage = MemStorage::new();
        let arena = ImageArena::new(64);
        let loader = Loader::new(&arena, &storage, CharacterPaths::new("characters", "fox"), 30);
        let result = block_on(loader.load_image(&descriptor("nope")));
        assert_eq!(result.unwrap_err(), LoadError::NotFound);
    }

    #[test]
    fn test_animation_frames_paced_and_reported() {
        let storage = MemStorage::new();
        Fixture::new(&storage, "fox").animation("yawn", &animation(3));
        let arena = ImageArena::new(64);
        let clock = FakeClock::new();
        let mut delay = FakeDelay::new(&clock);
        let loader = Loader::new(&arena, &storage, CharacterPaths::new("characters", "fox"), 30);
        let recorder = Recorder(RefCell::new(Vec::new()));
        let mut progress = Progress::new(&recorder, 3);

        let frames = block_on(loader.load_animation("yawn", &animation(3), &mut delay, &mut progress))
            .unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].as_bytes(), &[3, 3, 3, 3, 3, 3, 3, 3]);
        // Two gaps between three frames
        assert_eq!(clock.now_us(), 60_000);
        assert_eq!(
            *recorder.0.borrow(),
            vec![(0, 3), (1, 3), (2, 3), (3, 3)]
        );
    }

    #[test]
    fn test_animation_failure_releases_partial_frames() {
        let storage = MemStorage::new();
        Fixture::new(&storage, "fox").animation("yawn", &animation(3));
        storage.delete("characters/fox/animations/yawn/frames/3.bin");
        let arena = ImageArena::new(64);
        let clock = FakeClock::new();
        let mut delay = FakeDelay::new(&clock);
        let loader = Loader::new(&arena, &storage, CharacterPaths::new("characters", "fox"), 30);
        let mut progress = Progress::new(&(), 3);

        let result = block_on(loader.load_animation("yawn", &animation(3), &mut delay, &mut progress));
        assert_eq!(result.unwrap_err(), LoadError::NotFound);
        assert_eq!(arena.live_allocations(), 0);
    }

    #[test]
    fn test_short_frame_is_incompatible() {
        let storage = MemStorage::new();
        Fixture::new(&storage, "fox").animation("yawn", &animation(1));
        storage.put("characters/fox/animations/yawn/frames/1.bin", vec![0u8; 3]);
        let arena = ImageArena::new(64);
        let loader = Loader::new(&arena, &storage, CharacterPaths::new("characters", "fox"), 30);

        let mut buffer = [0u8; 8];
        let result = block_on(loader.read_frame_into("yawn", 1, &mut buffer));
        assert!(matches!(result, Err(LoadError::Incompatible(_))));
    }

    #[test]
    fn test_oversized_animation_is_rejected() {
        let storage = MemStorage::new();
        let arena = ImageArena::new(64);
        let clock = FakeClock::new();
        let mut delay = FakeDelay::new(&clock);
        let loader = Loader::new(&arena, &storage, CharacterPaths::new("characters", "fox"), 30);
        let huge = Animation {
            width: u32::MAX,
            height: u32::MAX,
            frame_count: u32::MAX,
            ..animation(1)
        };
        // Decodes fine; the size is only rejected when loading
        let decoded = Animation::decode(&huge.to_bytes()).unwrap();
        assert_eq!(decoded.frame_bytes(), None);

        let mut progress = Progress::new(&(), 1);
        let result = block_on(loader.load_animation("huge", &huge, &mut delay, &mut progress));
        assert_eq!(result.unwrap_err(), LoadError::OutOfMemory);
        assert_eq!(arena.live_allocations(), 0);
    }
}
