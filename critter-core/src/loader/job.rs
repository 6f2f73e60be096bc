//! Loader jobs
//!
//! The machine posts at most one job at a time; a single worker runs it and
//! hands the outcome back.

use alloc::string::String;
use alloc::sync::Arc;

use super::{AssetSet, CookedSet, LayerPlan};
use crate::character::Character;
use crate::error::LoadError;

/// Work for the loader worker
#[derive(Debug)]
pub enum Job {
    /// Cook the visual of `target`
    Cook {
        character: Arc<Character>,
        target: String,
    },
    /// Make `plan.layer` resident, then switch to `target`
    LoadLayer {
        character: Arc<Character>,
        target: String,
        plan: LayerPlan,
    },
}

impl Job {
    /// State the job prepares
    pub fn target(&self) -> &str {
        match self {
            Job::Cook { target, .. } | Job::LoadLayer { target, .. } => target,
        }
    }
}

/// Result of a finished job
#[derive(Debug)]
pub enum JobOutcome {
    Cooked {
        character: Arc<Character>,
        target: String,
        result: Result<CookedSet, LoadError>,
    },
    LayerLoaded {
        character: Arc<Character>,
        target: String,
        plan: LayerPlan,
        result: Result<AssetSet, LoadError>,
    },
}

impl JobOutcome {
    /// Character the job was run for
    pub fn character(&self) -> &Arc<Character> {
        match self {
            JobOutcome::Cooked { character, .. } | JobOutcome::LayerLoaded { character, .. } => {
                character
            }
        }
    }
}
