//! Command service
//!
//! Receives raw request frames from the transport, dispatches them and
//! queues the encoded response. Frames that fail to decode get no response.

use embedded_hal_async::delay::DelayNs;

use critter_core::dispatch::handle_frame;
use critter_core::traits::{AssetStorage, Clock};
use critter_core::CharacterMachine;

use crate::channels::FrameQueue;

pub async fn command_service<S: AssetStorage, C: Clock, W: DelayNs>(
    machine: &CharacterMachine<'_, S, C>,
    requests: &FrameQueue,
    responses: &FrameQueue,
    delay: &mut W,
) {
    info!("command service started");

    loop {
        let frame = requests.receive().await;
        let Some(response) = handle_frame(machine, &frame, delay).await else {
            continue;
        };

        match response.encode_to_vec() {
            Ok(bytes) => responses.send(bytes).await,
            Err(e) => warn!("response encoding failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Frame;
    use crate::fs::DirStorage;
    use crate::tests::write_character;
    use critter_core::config::EngineConfig;
    use critter_core::ImageArena;
    use critter_protocol::{Command, Response};
    use embassy_futures::block_on;
    use embassy_futures::select::select;
    use embassy_sync::channel::Channel;
    use embassy_time::Delay;

    use crate::EmbassyClock;

    #[test]
    fn test_requests_answered_in_order() {
        let storage = DirStorage::temporary("commands");
        write_character(&storage, "fox", "Fox");
        write_character(&storage, "owl", "Owl");
        let arena = ImageArena::new(1024);
        let machine = CharacterMachine::new(&arena, &storage, EmbassyClock, EngineConfig::default());
        let requests: FrameQueue = Channel::new();
        let responses: FrameQueue = Channel::new();

        let client = async {
            for index in [1u16, 0, 7] {
                let request = Command::GetCharacter { index }.to_request().unwrap();
                requests.send(request.encode_to_vec().unwrap()).await;
            }
            // Dropped: wrong magic byte
            requests.send(Frame::from_slice(&[0x00, 0x03]).unwrap()).await;

            let mut texts = Vec::new();
            for _ in 0..3 {
                let response = Response::decode(&responses.receive().await).unwrap();
                texts.push((response.success, response.text().unwrap_or("").to_owned()));
            }
            texts
        };

        let mut delay = Delay;
        let service = command_service(&machine, &requests, &responses, &mut delay);
        let texts = match block_on(select(service, client)) {
            embassy_futures::select::Either::Second(texts) => texts,
            embassy_futures::select::Either::First(()) => unreachable!(),
        };

        assert_eq!(
            texts,
            vec![
                (true, "owl".to_owned()),
                (true, "fox".to_owned()),
                (false, "Unknown character".to_owned()),
            ]
        );
        assert!(responses.try_receive().is_err());
    }
}
