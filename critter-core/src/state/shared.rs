//! State shared between the tick task, the loader worker and the dispatcher
//!
//! Every field is only touched inside the machine's critical section. The
//! methods here never block and never perform I/O; anything that must be
//! dropped or posted is handed back to the caller.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use core::cell::RefCell;
use core::mem;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use rand::RngCore;

use super::triggers;
use crate::character::Character;
use crate::error::{LoadError, SwitchError};
use crate::loader::{
    needs_cooking, plan_layer, AssetSet, CookedSet, Job, JobOutcome, ResidentAssets,
};

pub(crate) type SharedCell = Mutex<CriticalSectionRawMutex, RefCell<Shared>>;

/// Loading bar state, applied to the display by the tick task
#[derive(Debug, Default)]
pub(crate) struct ProgressState {
    dirty: bool,
    visible: bool,
    current: u32,
    total: u32,
}

impl ProgressState {
    pub(crate) fn show(&mut self) {
        self.visible = true;
        self.current = 0;
        self.total = 0;
        self.dirty = true;
    }

    pub(crate) fn hide(&mut self) {
        if self.visible {
            self.visible = false;
            self.dirty = true;
        }
    }

    pub(crate) fn update(&mut self, current: u32, total: u32) {
        self.current = current;
        self.total = total;
        self.dirty = true;
    }

    /// Pending display change: `Some(None)` hides the bar
    pub(crate) fn take(&mut self) -> Option<Option<(u32, u32)>> {
        if !mem::take(&mut self.dirty) {
            return None;
        }
        Some(self.visible.then_some((self.current, self.total)))
    }
}

/// Short message shown over the character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Notice {
    pub title: &'static str,
    pub detail: &'static str,
}

/// Arena handles that must be dropped outside the critical section
#[derive(Debug, Default)]
pub(crate) struct Released {
    pub cooked: Option<CookedSet>,
    pub assets: AssetSet,
    pub preloaded: AssetSet,
}

/// What a switch request turned into
#[derive(Debug)]
pub(crate) enum Applied {
    /// State flipped; the old handles are in the payload
    Switched(Released),
    /// A loader job must be posted
    Post(Job),
    /// Nothing further to do
    Idle(Released),
}

#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub ready: bool,
    pub character: Option<Arc<Character>>,
    pub preloaded: AssetSet,
    pub layer: AssetSet,
    pub prepared_layer: Option<u16>,
    pub pending_evictions: Option<ResidentAssets>,
    pub cooked: Option<CookedSet>,

    pub current: String,
    pub last_transition_us: u64,
    pub sequence_cursor: Option<usize>,
    pub next_frame_us: u64,
    pub random_delays: BTreeMap<String, i64>,

    pub queued: Option<String>,
    pub busy: bool,
    pub loading_character: bool,
    pub cooking: Option<String>,
    pub layer_loading: Option<String>,

    pub ui_dirty: bool,
    pub info_dirty: bool,
    pub tapped: bool,
    pub progress: ProgressState,
    pub notice: Option<Notice>,
    pub notice_until_us: Option<u64>,
}

impl Shared {
    /// A cook or layer load is in flight
    pub(crate) fn is_loading(&self) -> bool {
        self.cooking.is_some() || self.layer_loading.is_some()
    }

    /// Switches can be applied right away
    pub(crate) fn is_free(&self) -> bool {
        !self.busy && !self.is_loading() && !self.loading_character
    }

    /// The current sequence frame has run out
    pub(crate) fn sequence_due(&self, now_us: u64) -> bool {
        self.sequence_cursor.is_some() && now_us > self.next_frame_us
    }

    /// Handle a switch request from any task
    ///
    /// While the machine is not free the request replaces whatever sits in
    /// the queue, unless it names the state already being prepared.
    pub(crate) fn request(&mut self, target: &str, now_us: u64) -> Result<Applied, SwitchError> {
        if self.loading_character {
            return Err(SwitchError::NotReady);
        }
        let character = self.character.clone().ok_or(SwitchError::NotReady)?;
        if character.state(target).is_none() {
            return Err(SwitchError::NotFound);
        }

        if !self.is_free() {
            let in_flight = self.cooking.as_deref() == Some(target)
                || self.layer_loading.as_deref() == Some(target);
            // The newest request wins; asking for the state in flight cancels the queue
            self.queued = (!in_flight).then(|| target.into());
            return Err(SwitchError::Queued);
        }

        self.apply(&character, target, now_us)
    }

    /// Apply a switch on a free machine
    ///
    /// Layer first, then cooking, then the flip itself.
    fn apply(
        &mut self,
        character: &Arc<Character>,
        target: &str,
        now_us: u64,
    ) -> Result<Applied, SwitchError> {
        let state = character.state(target).ok_or(SwitchError::NotFound)?;

        if self.prepared_layer != Some(state.layer) {
            let plan = plan_layer(character, state.layer, &self.layer.resident());
            if plan.is_loaded() {
                // Everything needed is already resident
                self.prepared_layer = Some(plan.layer);
                self.pending_evictions = Some(plan.evict);
            } else {
                self.layer_loading = Some(target.into());
                self.progress.show();
                return Ok(Applied::Post(Job::LoadLayer {
                    character: character.clone(),
                    target: target.into(),
                    plan,
                }));
            }
        }

        if needs_cooking(character, state) {
            self.cooking = Some(target.into());
            self.progress.show();
            return Ok(Applied::Post(Job::Cook {
                character: character.clone(),
                target: target.into(),
            }));
        }

        Ok(Applied::Switched(self.flip(target, now_us, None)))
    }

    /// Make `target` current and install its cooked set
    fn flip(&mut self, target: &str, now_us: u64, cooked: Option<CookedSet>) -> Released {
        self.current = target.into();
        self.last_transition_us = now_us;
        self.sequence_cursor = None;
        self.next_frame_us = 0;
        self.random_delays.clear();
        self.ui_dirty = true;

        let assets = match self.pending_evictions.take() {
            Some(names) => self.layer.evict(&names),
            None => AssetSet::default(),
        };
        Released {
            cooked: mem::replace(&mut self.cooked, cooked),
            assets,
            preloaded: AssetSet::default(),
        }
    }

    /// Fold a finished loader job back into the machine
    pub(crate) fn finish(&mut self, outcome: JobOutcome, now_us: u64) -> Applied {
        let current = self
            .character
            .as_ref()
            .is_some_and(|c| Arc::ptr_eq(c, outcome.character()));
        if !current {
            // Prepared for a character that has since been replaced
            let mut released = Released::default();
            match outcome {
                JobOutcome::Cooked { result, .. } => released.cooked = result.ok(),
                JobOutcome::LayerLoaded { result, .. } => {
                    released.assets = result.unwrap_or_default();
                }
            }
            return Applied::Idle(released);
        }

        match outcome {
            JobOutcome::Cooked { target, result, .. } => {
                self.cooking = None;
                self.progress.hide();
                match result {
                    Ok(set) => Applied::Switched(self.flip(&target, now_us, Some(set))),
                    Err(e) => {
                        self.fail(e, now_us);
                        Applied::Idle(Released::default())
                    }
                }
            }
            JobOutcome::LayerLoaded {
                target,
                plan,
                result,
                ..
            } => {
                self.layer_loading = None;
                match result {
                    Ok(set) => {
                        self.layer.merge(set);
                        self.prepared_layer = Some(plan.layer);
                        self.pending_evictions = Some(plan.evict);
                        let applied = match self.character.clone() {
                            Some(character) => self.apply(&character, &target, now_us),
                            None => Err(SwitchError::NotReady),
                        };
                        if !self.is_loading() {
                            self.progress.hide();
                        }
                        applied.unwrap_or(Applied::Idle(Released::default()))
                    }
                    Err(e) => {
                        self.progress.hide();
                        self.fail(e, now_us);
                        Applied::Idle(Released::default())
                    }
                }
            }
        }
    }

    /// Keep the current state after a failed load
    ///
    /// The state timer restarts so the same transition does not fire again
    /// on the very next tick.
    fn fail(&mut self, error: LoadError, now_us: u64) {
        self.last_transition_us = now_us;
        self.random_delays.clear();
        self.notice = Some(Notice {
            title: "Couldn't load state",
            detail: error.as_str(),
        });
    }

    /// Evaluate the current state's transitions, consuming the tap flag
    pub(crate) fn evaluate_transitions<R: RngCore>(
        &mut self,
        now_us: u64,
        rng: &mut R,
    ) -> Option<String> {
        let tapped = mem::take(&mut self.tapped);
        if self.is_loading() || self.loading_character {
            return None;
        }

        let character = self.character.clone()?;
        let state = character.state(&self.current)?;
        let elapsed = i64::try_from(now_us.saturating_sub(self.last_transition_us))
            .unwrap_or(i64::MAX);
        triggers::evaluate(
            &state.transitions,
            elapsed,
            tapped,
            &mut self.random_delays,
            rng,
        )
        .map(|t| t.target.clone())
    }

    /// Drop the character and hand back everything it held
    pub(crate) fn unload(&mut self) -> (Option<Arc<Character>>, Released) {
        self.ready = false;
        self.prepared_layer = None;
        self.pending_evictions = None;
        self.queued = None;
        self.cooking = None;
        self.layer_loading = None;
        self.progress.hide();
        self.current.clear();
        self.sequence_cursor = None;
        self.random_delays.clear();
        let released = Released {
            cooked: self.cooked.take(),
            assets: mem::take(&mut self.layer),
            preloaded: mem::take(&mut self.preloaded),
        };
        (self.character.take(), released)
    }

    /// Install a freshly loaded character and switch to its default state
    ///
    /// Runs while the character load still holds the machine, so the switch
    /// is applied directly instead of being queued.
    pub(crate) fn install(
        &mut self,
        character: Arc<Character>,
        preloaded: AssetSet,
        layer: AssetSet,
        layer_number: u16,
        now_us: u64,
    ) -> Result<Applied, SwitchError> {
        self.character = Some(character.clone());
        self.preloaded = preloaded;
        self.layer = layer;
        self.prepared_layer = Some(layer_number);
        self.info_dirty = true;
        self.ui_dirty = true;
        self.tapped = false;
        self.ready = true;
        self.apply(&character, &character.default_state, now_us)
    }
}

/// Holds the machine for a character load
///
/// Switch requests are refused and the tick leaves the machine alone until
/// the guard is dropped.
pub(crate) struct LoadGuard<'m> {
    shared: &'m SharedCell,
}

impl<'m> LoadGuard<'m> {
    /// Take the machine if it is free
    pub(crate) fn try_new(shared: &'m SharedCell) -> Option<Self> {
        shared.lock(|cell| {
            let mut s = cell.borrow_mut();
            if !s.is_free() {
                return None;
            }
            s.loading_character = true;
            Some(Self { shared })
        })
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.shared
            .lock(|cell| cell.borrow_mut().loading_character = false);
    }
}

/// Marks the machine busy for as long as it lives
pub(crate) struct BusyGuard<'m> {
    shared: &'m SharedCell,
}

impl<'m> BusyGuard<'m> {
    pub(crate) fn new(shared: &'m SharedCell) -> Self {
        shared.lock(|cell| cell.borrow_mut().busy = true);
        Self { shared }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.shared.lock(|cell| cell.borrow_mut().busy = false);
    }
}
