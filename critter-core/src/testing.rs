//! In-memory fakes for host tests

#![allow(dead_code)]

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use embedded_hal_async::delay::DelayNs;

use crate::character::{Action, Animation, ImageDescriptor, SequenceFrame};
use crate::format::{CharacterRecord, Record, StateImageRecord, StateRecord, TransitionRecord};
use crate::library::CharacterPaths;
use crate::traits::{
    AnimationFrame, AssetStorage, CharacterDisplay, Clock, DisplayError, StorageError,
};

/// Flat path → bytes map; directories are implied by file paths
#[derive(Default)]
pub struct MemStorage {
    files: RefCell<BTreeMap<String, Vec<u8>>>,
    reads: Cell<usize>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &str, bytes: Vec<u8>) {
        self.files.borrow_mut().insert(path.to_string(), bytes);
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.borrow().contains_key(path)
    }

    pub fn delete(&self, path: &str) {
        self.files.borrow_mut().remove(path);
    }

    /// Number of successful `read` calls so far
    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl AssetStorage for MemStorage {
    async fn file_size(&self, path: &str) -> Result<Option<usize>, StorageError> {
        Ok(self.files.borrow().get(path).map(Vec::len))
    }

    async fn read(&self, path: &str, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let files = self.files.borrow();
        let data = files.get(path).ok_or(StorageError::NotFound)?;
        let len = data.len().min(buffer.len());
        buffer[..len].copy_from_slice(&data[..len]);
        self.reads.set(self.reads.get() + 1);
        Ok(len)
    }

    async fn list_dirs(&self, path: &str) -> Result<Vec<String>, StorageError> {
        let prefix = alloc::format!("{}/", path);
        let dirs: BTreeSet<String> = self
            .files
            .borrow()
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split_once('/').map(|(dir, _)| dir.to_string()))
            .collect();
        Ok(dirs.into_iter().collect())
    }

    async fn create_file(&self, path: &str) -> Result<(), StorageError> {
        self.put(path, Vec::new());
        Ok(())
    }

    async fn remove_file(&self, path: &str) -> Result<(), StorageError> {
        self.delete(path);
        Ok(())
    }
}

/// Storage that yields to the executor before every call
pub struct Yielding<'a>(pub &'a MemStorage);

impl AssetStorage for Yielding<'_> {
    async fn file_size(&self, path: &str) -> Result<Option<usize>, StorageError> {
        embassy_futures::yield_now().await;
        self.0.file_size(path).await
    }

    async fn read(&self, path: &str, buffer: &mut [u8]) -> Result<usize, StorageError> {
        embassy_futures::yield_now().await;
        self.0.read(path, buffer).await
    }

    async fn list_dirs(&self, path: &str) -> Result<Vec<String>, StorageError> {
        embassy_futures::yield_now().await;
        self.0.list_dirs(path).await
    }

    async fn create_file(&self, path: &str) -> Result<(), StorageError> {
        embassy_futures::yield_now().await;
        self.0.create_file(path).await
    }

    async fn remove_file(&self, path: &str) -> Result<(), StorageError> {
        embassy_futures::yield_now().await;
        self.0.remove_file(path).await
    }
}

/// Writes character directories with the record encoders
pub struct Fixture<'a> {
    pub storage: &'a MemStorage,
    paths: CharacterPaths<'a>,
}

impl<'a> Fixture<'a> {
    pub fn new(storage: &'a MemStorage, id: &'a str) -> Self {
        Self {
            storage,
            paths: CharacterPaths::new("characters", id),
        }
    }

    pub fn character(&self, name: &str, species: &str, default_state: &str) -> &Self {
        let record = CharacterRecord {
            name: name.into(),
            species: species.into(),
            default_state: default_state.into(),
        };
        self.storage.put(&self.paths.character(), record.to_bytes());
        self
    }

    pub fn state(&self, name: &str, layer: u16, image: StateImageRecord) -> &Self {
        let record = StateRecord { layer, image };
        self.storage.put(&self.paths.state(name), record.to_bytes());
        self
    }

    pub fn sequence_frame(&self, state: &str, index: usize, frame: &SequenceFrame) -> &Self {
        self.storage
            .put(&self.paths.sequence_frame(state, index), frame.to_bytes());
        self
    }

    pub fn transition(&self, state: &str, target: &str, record: TransitionRecord) -> &Self {
        self.storage
            .put(&self.paths.transition(state, target), record.to_bytes());
        self
    }

    /// Animation record plus `frame_count` frames filled with the frame number
    pub fn animation(&self, name: &str, animation: &Animation) -> &Self {
        self.storage
            .put(&self.paths.animation(name), animation.to_bytes());
        for i in 1..=animation.frame_count {
            self.storage.put(
                &self.paths.animation_frame(name, i),
                alloc::vec![i as u8; animation.frame_bytes().unwrap_or(0)],
            );
        }
        self
    }

    pub fn action(&self, id: &str, action: &Action) -> &Self {
        self.storage.put(&self.paths.action(id), action.to_bytes());
        self
    }

    /// Image file of `len` bytes filled with `fill`
    pub fn image(&self, name: &str, len: usize, fill: u8) -> &Self {
        self.storage
            .put(&self.paths.image(name), alloc::vec![fill; len]);
        self
    }
}

/// Everything the engine asked the display to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Info(String, String),
    Image { name: String, first_byte: u8 },
    Clear,
    Background(u16),
    Frame { first_byte: u8, at_us: u64 },
    Progress(Option<(u32, u32)>),
    Notice(String),
    HideNotice,
    Error(String),
}

/// Display that records calls, timestamped with a shared clock
pub struct RecordingDisplay<'a> {
    clock: &'a FakeClock,
    pub events: Vec<DisplayEvent>,
}

impl<'a> RecordingDisplay<'a> {
    pub fn new(clock: &'a FakeClock) -> Self {
        Self {
            clock,
            events: Vec::new(),
        }
    }

    pub fn frames(&self) -> Vec<(u8, u64)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Frame { first_byte, at_us } => Some((*first_byte, *at_us)),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Image { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DisplayEvent::Notice(_)))
            .count()
    }
}

impl CharacterDisplay for RecordingDisplay<'_> {
    fn show_character_info(&mut self, name: &str, species: &str) -> Result<(), DisplayError> {
        self.events
            .push(DisplayEvent::Info(name.into(), species.into()));
        Ok(())
    }

    fn show_image(&mut self, image: &ImageDescriptor, data: &[u8]) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::Image {
            name: image.name.clone(),
            first_byte: data.first().copied().unwrap_or(0),
        });
        Ok(())
    }

    fn clear_image(&mut self) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::Clear);
        Ok(())
    }

    fn fill_background(&mut self, color: u16) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::Background(color));
        Ok(())
    }

    fn draw_frame(&mut self, frame: &AnimationFrame<'_>) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::Frame {
            first_byte: frame.pixels.first().copied().unwrap_or(0),
            at_us: self.clock.now_us(),
        });
        Ok(())
    }

    fn set_progress(&mut self, progress: Option<(u32, u32)>) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::Progress(progress));
        Ok(())
    }

    fn show_notice(&mut self, title: &str, _detail: &str) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::Notice(title.into()));
        Ok(())
    }

    fn hide_notice(&mut self) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::HideNotice);
        Ok(())
    }

    fn show_error(&mut self, title: &str, _detail: &str) -> Result<(), DisplayError> {
        self.events.push(DisplayEvent::Error(title.into()));
        Ok(())
    }
}

/// Manually advanced clock
#[derive(Default)]
pub struct FakeClock {
    now: Cell<u64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_us(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms * 1000);
    }
}

impl Clock for FakeClock {
    fn now_us(&self) -> u64 {
        self.now.get()
    }
}

/// Delay that returns immediately after advancing the fake clock
pub struct FakeDelay<'a> {
    clock: &'a FakeClock,
}

impl<'a> FakeDelay<'a> {
    pub fn new(clock: &'a FakeClock) -> Self {
        Self { clock }
    }
}

impl DelayNs for FakeDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_us(u64::from(ns) / 1000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.clock.advance_us(u64::from(us));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.clock.advance_ms(u64::from(ms));
    }
}
