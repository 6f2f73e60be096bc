//! Badge command protocol
//!
//! This crate defines the request/response contract used by the companion
//! app to query and drive the character running on the badge. The transport
//! (BLE characteristic writes and indications) lives outside this crate; only
//! the byte layout of the frames is specified here.
//!
//! # Protocol Overview
//!
//! Every request and response is a fixed-size frame:
//! ```text
//! Request                         Response
//! ┌───────┬────────┬──────────┐   ┌─────────┬────────┬──────────┐
//! │ MAGIC │ OPCODE │ PAYLOAD  │   │ SUCCESS │ OPCODE │ PAYLOAD  │
//! │ 1B    │ 1B     │ 200B     │   │ 1B      │ 1B     │ 200B     │
//! └───────┴────────┴──────────┘   └─────────┴────────┴──────────┘
//! ```
//!
//! Requests whose magic byte does not match [`COMMAND_MAGIC`] are dropped
//! without a response. String fields are null padded and read up to the
//! first null byte.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod commands;
pub mod frame;
pub mod text;

pub use commands::{Command, CommandError, Opcode};
pub use frame::{FrameError, Request, Response, COMMAND_MAGIC, FRAME_SIZE, PAYLOAD_SIZE};
pub use text::{read_str, write_str};
