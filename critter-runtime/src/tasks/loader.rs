//! Loader worker
//!
//! Waits on the machine's single job slot and runs cook and layer jobs to
//! completion, one at a time.

use embedded_hal_async::delay::DelayNs;

use critter_core::traits::{AssetStorage, Clock};
use critter_core::CharacterMachine;

pub async fn loader_worker<S: AssetStorage, C: Clock, W: DelayNs>(
    machine: &CharacterMachine<'_, S, C>,
    delay: &mut W,
) {
    info!("loader worker started");

    loop {
        let job = machine.next_job().await;
        let outcome = machine.run_job(job, delay).await;
        machine.finish_job(outcome);
    }
}
