//! Tick task for the state machine
//!
//! Renders, flushes overlays, drains the queued request and evaluates
//! transitions once per tick interval.

use embassy_time::{Duration, Ticker};
use embedded_hal_async::delay::DelayNs;
use rand::RngCore;

use critter_core::traits::{AssetStorage, CharacterDisplay, Clock};
use critter_core::CharacterMachine;

/// Drive the machine once per configured tick interval
pub async fn tick_loop<S, C, D, W, R>(
    machine: &CharacterMachine<'_, S, C>,
    display: &mut D,
    delay: &mut W,
    rng: &mut R,
) where
    S: AssetStorage,
    C: Clock,
    D: CharacterDisplay,
    W: DelayNs,
    R: RngCore,
{
    let interval = u64::from(machine.config().tick_interval_ms);
    info!("tick loop started, {} ms", interval);

    let mut ticker = Ticker::every(Duration::from_millis(interval));
    loop {
        machine.tick(display, delay, rng).await;
        ticker.next().await;
    }
}
