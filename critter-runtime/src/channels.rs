//! Inter-task communication channels
//!
//! The BLE transport pushes raw characteristic writes into [`REQUESTS`] and
//! sends whatever comes out of [`RESPONSES`] back as an indication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use critter_protocol::FRAME_SIZE;

/// Channel capacity for command frames
pub const COMMAND_QUEUE_SIZE: usize = 4;

/// One raw command or response frame
pub type Frame = Vec<u8, FRAME_SIZE>;

/// Queue of frames between the transport and the command service
pub type FrameQueue = Channel<CriticalSectionRawMutex, Frame, COMMAND_QUEUE_SIZE>;

/// Requests written by the companion app
pub static REQUESTS: FrameQueue = Channel::new();

/// Responses to indicate back to the companion app
pub static RESPONSES: FrameQueue = Channel::new();
