//! Engine task bodies
//!
//! Each body loops forever. Board crates spawn them as embassy tasks; the
//! simulator joins them with [`run`] on a single executor.

pub mod commands;
pub mod loader;
pub mod tick;

pub use commands::command_service;
pub use loader::loader_worker;
pub use tick::tick_loop;

use embassy_futures::join::join3;
use embassy_time::Delay;
use rand::RngCore;

use critter_core::traits::{AssetStorage, CharacterDisplay, Clock};
use critter_core::CharacterMachine;

use crate::channels::FrameQueue;

/// Run all engine tasks concurrently
pub async fn run<S, C, D, R>(
    machine: &CharacterMachine<'_, S, C>,
    display: &mut D,
    rng: &mut R,
    requests: &FrameQueue,
    responses: &FrameQueue,
) where
    S: AssetStorage,
    C: Clock,
    D: CharacterDisplay,
    R: RngCore,
{
    join3(
        tick_loop(machine, display, &mut Delay, rng),
        loader_worker(machine, &mut Delay),
        command_service(machine, requests, responses, &mut Delay),
    )
    .await;
}
