//! Machine context and public operations

use alloc::string::String;
use alloc::sync::Arc;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;
use rand::RngCore;

use super::shared::{Applied, LoadGuard, Notice, Shared, SharedCell};
use crate::arena::ImageArena;
use crate::character::{ActionEffect, Character};
use crate::config::EngineConfig;
use crate::error::{LoadError, SwitchError};
use crate::library::{decode_character, CharacterLibrary, CharacterPaths};
use crate::loader::{plan_layer, AssetSet, Job, JobOutcome, Loader, ProgressSink, ResidentAssets};
use crate::traits::{AssetStorage, CharacterDisplay, Clock, DisplayError};

/// Header data of the loaded character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterInfo {
    pub id: String,
    pub name: String,
    pub species: String,
    pub action_count: usize,
}

/// The character engine
///
/// Shared by reference between the tick task, the loader worker and the
/// command service. Holds at most one queued switch request and at most one
/// pending loader job.
pub struct CharacterMachine<'a, S, C> {
    pub(super) arena: &'a ImageArena,
    pub(super) storage: &'a S,
    pub(super) clock: C,
    pub(super) config: EngineConfig,
    pub(super) shared: SharedCell,
    jobs: Signal<CriticalSectionRawMutex, Job>,
}

impl<'a, S: AssetStorage, C: Clock> CharacterMachine<'a, S, C> {
    pub fn new(arena: &'a ImageArena, storage: &'a S, clock: C, config: EngineConfig) -> Self {
        Self {
            arena,
            storage,
            clock,
            config,
            shared: Mutex::new(RefCell::new(Shared::default())),
            jobs: Signal::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(super) fn with<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> R {
        self.shared.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub(super) fn loader<'l>(&'l self, character: &'l Character) -> Loader<'l, S> {
        Loader::new(
            self.arena,
            self.storage,
            CharacterPaths::new(self.config.characters_root.as_str(), &character.id),
            self.config.frame_pacing_ms,
        )
    }

    /// Character directory access under the configured root
    pub fn library(&self) -> CharacterLibrary<'_, S> {
        CharacterLibrary::new(self.storage, self.config.characters_root.as_str())
    }

    /// A character is loaded and ticking
    pub fn is_ready(&self) -> bool {
        self.with(|s| s.ready)
    }

    /// Not rendering, cooking or loading a layer
    pub fn is_free(&self) -> bool {
        self.with(|s| s.is_free())
    }

    /// Name of the current state
    pub fn current_state(&self) -> Option<String> {
        self.with(|s| (s.ready && !s.current.is_empty()).then(|| s.current.clone()))
    }

    /// The loaded character
    pub fn character(&self) -> Option<Arc<Character>> {
        self.with(|s| s.character.clone())
    }

    pub fn info(&self) -> Option<CharacterInfo> {
        self.character().map(|c| CharacterInfo {
            id: c.id.clone(),
            name: c.name.clone(),
            species: c.species.clone(),
            action_count: c.actions.len(),
        })
    }

    /// Record a tap; consumed by the next tick
    pub fn tap(&self) {
        self.with(|s| s.tapped = true);
    }

    /// Id of the action at `index`
    pub fn action_id_at(&self, index: usize) -> Option<String> {
        self.character()
            .and_then(|c| c.action_id_at(index).map(String::from))
    }

    /// Button text of action `id`
    pub fn action_display(&self, id: &str) -> Option<String> {
        self.character()
            .and_then(|c| c.action(id).map(|a| a.display.clone()))
    }

    /// Run action `id`
    ///
    /// An unknown action is `NotFound`; a switch that had to be queued still
    /// counts as accepted.
    pub fn invoke_action(&self, id: &str) -> Result<(), SwitchError> {
        let character = self.character().ok_or(SwitchError::NotReady)?;
        let action = character.action(id).ok_or(SwitchError::NotFound)?;
        info!("action {}", id);
        match &action.effect {
            ActionEffect::SwitchState(target) => match self.switch_state(target) {
                Ok(()) | Err(SwitchError::Queued) => Ok(()),
                Err(e) => Err(e),
            },
        }
    }

    /// Request a switch to `target`
    ///
    /// Returns `Err(Queued)` when the machine is busy; the request is then
    /// applied by a later tick.
    pub fn switch_state(&self, target: &str) -> Result<(), SwitchError> {
        let now = self.clock.now_us();
        match self.with(|s| s.request(target, now)) {
            Ok(applied) => {
                self.dispatch(applied);
                Ok(())
            }
            Err(SwitchError::Queued) => {
                debug!("switch to {} queued", target);
                Err(SwitchError::Queued)
            }
            Err(e) => {
                warn!("switch to {} rejected: {}", target, e);
                Err(e)
            }
        }
    }

    /// Act on a decision made inside the critical section
    fn dispatch(&self, applied: Applied) {
        match applied {
            Applied::Switched(released) => {
                trace!("switched, releasing {} cooked", released.cooked.is_some());
                drop(released);
            }
            Applied::Post(job) => {
                debug!("posting job for {}", job.target());
                self.jobs.signal(job);
            }
            Applied::Idle(released) => drop(released),
        }
    }

    /// Wait for the next loader job
    pub async fn next_job(&self) -> Job {
        self.jobs.wait().await
    }

    /// Take the pending loader job, if any
    pub fn try_next_job(&self) -> Option<Job> {
        self.jobs.try_take()
    }

    /// Run a job; touches no machine state except progress
    pub async fn run_job<D: DelayNs>(&self, job: Job, delay: &mut D) -> JobOutcome {
        match job {
            Job::Cook { character, target } => {
                let result = self
                    .loader(&character)
                    .cook(&character, &target, delay, self)
                    .await;
                if let Err(e) = &result {
                    warn!("cook {} failed: {}", target.as_str(), e);
                }
                JobOutcome::Cooked {
                    character,
                    target,
                    result,
                }
            }
            Job::LoadLayer {
                character,
                target,
                plan,
            } => {
                let result = self
                    .loader(&character)
                    .load_layer(&character, &plan, delay, self)
                    .await;
                if let Err(e) = &result {
                    warn!("layer {} failed: {}", plan.layer, e);
                }
                JobOutcome::LayerLoaded {
                    character,
                    target,
                    plan,
                    result,
                }
            }
        }
    }

    /// Publish a job outcome
    ///
    /// A cooked set is swapped in together with the state flip; the handles
    /// it replaces are dropped after the critical section.
    pub fn finish_job(&self, outcome: JobOutcome) {
        let now = self.clock.now_us();
        let applied = self.with(|s| s.finish(outcome, now));
        self.dispatch(applied);
    }

    /// Run the pending job to completion, if any
    pub async fn process_pending_job<D: DelayNs>(&self, delay: &mut D) -> bool {
        match self.try_next_job() {
            Some(job) => {
                let outcome = self.run_job(job, delay).await;
                self.finish_job(outcome);
                true
            }
            None => false,
        }
    }

    /// Poll until the machine is free
    pub async fn wait_until_free<D: DelayNs>(&self, delay: &mut D) {
        while !self.is_free() {
            delay.delay_ms(self.config.wait_poll_ms).await;
        }
    }

    /// Replace the loaded character
    ///
    /// Holds the machine from the first read to the default state switch, so
    /// no request or tick runs against a half-swapped character. Decodes
    /// first, so a malformed character never disturbs the running one. The previous character's arena data is released before the new
    /// one is preloaded; if preloading fails the previous character is
    /// restored.
    pub async fn load_character<D: DelayNs>(
        &self,
        id: &str,
        delay: &mut D,
    ) -> Result<(), LoadError> {
        let _guard = loop {
            match LoadGuard::try_new(&self.shared) {
                Some(guard) => break guard,
                None => delay.delay_ms(self.config.wait_poll_ms).await,
            }
        };
        info!("loading character {}", id);

        let root = self.config.characters_root.as_str();
        let character = match decode_character(self.storage, root, id).await {
            Ok(character) => Arc::new(character),
            Err(e) => {
                error!("character {} rejected: {}", id, e);
                return Err(e);
            }
        };

        let (previous, released) = self.with(|s| s.unload());
        drop(released);

        match self.install(character, delay).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!("character {} failed to load: {}", id, e);
                if let Some(previous) = previous {
                    if let Err(restore) = self.install(previous, delay).await {
                        error!("previous character lost: {}", restore);
                    }
                }
                Err(e)
            }
        }
    }

    /// Load whichever character the library marks as selected, or the first
    pub async fn load_selected_or_first<D: DelayNs>(&self, delay: &mut D) -> Result<(), LoadError> {
        match self.library().selected_or_first().await? {
            Some(id) => self.load_character(&id, delay).await,
            None => Err(LoadError::NotFound),
        }
    }

    /// Preload, prepare the default layer and switch to the default state
    async fn install<D: DelayNs>(
        &self,
        character: Arc<Character>,
        delay: &mut D,
    ) -> Result<(), LoadError> {
        let layer = character
            .state(&character.default_state)
            .map(|s| s.layer)
            .ok_or(LoadError::NotFound)?;

        self.with(|s| s.progress.show());
        let loaded = self.preload_with_layer(&character, layer, delay).await;
        self.with(|s| s.progress.hide());
        let (preloaded, layer_set) = loaded?;

        let now = self.clock.now_us();
        let applied = self.with(|s| s.install(character, preloaded, layer_set, layer, now));
        match applied {
            Ok(applied) => {
                self.dispatch(applied);
                Ok(())
            }
            Err(_) => Err(LoadError::NotFound),
        }
    }

    async fn preload_with_layer<D: DelayNs>(
        &self,
        character: &Character,
        layer: u16,
        delay: &mut D,
    ) -> Result<(AssetSet, AssetSet), LoadError> {
        let loader = self.loader(character);
        let preloaded = loader.preload(character, delay, self).await?;
        let plan = plan_layer(character, layer, &ResidentAssets::default());
        let layer_set = loader.load_layer(character, &plan, delay, self).await?;
        Ok((preloaded, layer_set))
    }

    /// Queue a notice for the next tick
    pub(super) fn post_notice(&self, title: &'static str, detail: &'static str) {
        self.with(|s| s.notice = Some(Notice { title, detail }));
    }

    /// One tick of the machine
    ///
    /// Renders when something changed, applies overlays, drains the queued
    /// request and finally evaluates the current state's transitions.
    pub async fn tick<D: CharacterDisplay, W: DelayNs, R: RngCore>(
        &self,
        display: &mut D,
        delay: &mut W,
        rng: &mut R,
    ) {
        let now = self.clock.now_us();
        let render = self.with(|s| {
            s.ready && s.is_free() && (s.ui_dirty || s.sequence_due(now))
        });
        if render {
            self.render(display, delay).await;
        }

        self.flush_overlays(display);
        if !self.is_ready() {
            return;
        }

        let queued = self.with(|s| if s.is_free() { s.queued.take() } else { None });
        if let Some(target) = queued {
            let _ = self.switch_state(&target);
        }

        let now = self.clock.now_us();
        if let Some(target) = self.with(|s| s.evaluate_transitions(now, rng)) {
            debug!("transition to {}", target.as_str());
            let _ = self.switch_state(&target);
        }
    }

    /// Apply header, progress and notice changes
    fn flush_overlays<D: CharacterDisplay>(&self, display: &mut D) {
        let now = self.clock.now_us();
        let notice_duration = self.config.notice_duration_us();

        let (info, progress, notice, hide_notice) = self.with(|s| {
            let info = if core::mem::take(&mut s.info_dirty) {
                s.character.clone()
            } else {
                None
            };
            let progress = s.progress.take();
            let notice = s.notice.take();
            let mut hide_notice = false;
            if notice.is_some() {
                s.notice_until_us = Some(now + notice_duration);
            } else if s.notice_until_us.is_some_and(|until| now >= until) {
                s.notice_until_us = None;
                hide_notice = true;
            }
            (info, progress, notice, hide_notice)
        });

        if let Some(character) = info {
            best_effort(display.show_character_info(&character.name, &character.species));
        }
        if let Some(progress) = progress {
            best_effort(display.set_progress(progress));
        }
        if let Some(notice) = notice {
            best_effort(display.show_notice(notice.title, notice.detail));
        }
        if hide_notice {
            best_effort(display.hide_notice());
        }
    }
}

impl<S: AssetStorage, C: Clock> ProgressSink for CharacterMachine<'_, S, C> {
    fn report(&self, current: u32, total: u32) {
        self.with(|s| s.progress.update(current, total));
    }
}

/// Log display failures; drawing is best effort
pub(super) fn best_effort(result: Result<(), DisplayError>) {
    if let Err(e) = result {
        warn!("display: {}", e);
    }
}
