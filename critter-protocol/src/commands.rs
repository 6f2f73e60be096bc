//! Command opcodes and typed commands
//!
//! Index arguments are little-endian `u16` at the start of the payload.
//! Name arguments fill the payload as a null-padded string.

use crate::frame::{FrameError, Request, PAYLOAD_SIZE};
use crate::text::{read_str, write_str};

/// Command identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// Get the id of the action at an index
    GetAction = 0,
    /// Get the display text of an action
    GetActionDisplayName = 1,
    /// Run an action
    InvokeAction = 2,
    /// Get the id of the character at an index
    GetCharacter = 3,
    /// Select and load another character
    SwitchCharacter = 4,
}

impl Opcode {
    /// Parse an opcode from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Opcode::GetAction),
            1 => Some(Opcode::GetActionDisplayName),
            2 => Some(Opcode::InvokeAction),
            3 => Some(Opcode::GetCharacter),
            4 => Some(Opcode::SwitchCharacter),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Errors when interpreting a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Opcode not known to this firmware
    UnknownOpcode(u8),
    /// String argument is not valid UTF-8
    InvalidString,
}

/// A decoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    /// Look up an action id by position
    GetAction { index: u16 },
    /// Look up an action's display text
    GetActionDisplayName { id: &'a str },
    /// Run an action
    InvokeAction { id: &'a str },
    /// Look up a character id by position
    GetCharacter { index: u16 },
    /// Switch the active character
    SwitchCharacter { name: &'a str },
}

impl<'a> Command<'a> {
    /// Interpret a request
    pub fn from_request(request: &'a Request) -> Result<Self, CommandError> {
        let opcode =
            Opcode::from_byte(request.opcode).ok_or(CommandError::UnknownOpcode(request.opcode))?;

        let index = move || u16::from_le_bytes([request.payload[0], request.payload[1]]);
        let text = move || read_str(&request.payload).map_err(|_| CommandError::InvalidString);

        Ok(match opcode {
            Opcode::GetAction => Command::GetAction { index: index() },
            Opcode::GetActionDisplayName => Command::GetActionDisplayName { id: text()? },
            Opcode::InvokeAction => Command::InvokeAction { id: text()? },
            Opcode::GetCharacter => Command::GetCharacter { index: index() },
            Opcode::SwitchCharacter => Command::SwitchCharacter { name: text()? },
        })
    }

    /// Opcode of this command
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::GetAction { .. } => Opcode::GetAction,
            Command::GetActionDisplayName { .. } => Opcode::GetActionDisplayName,
            Command::InvokeAction { .. } => Opcode::InvokeAction,
            Command::GetCharacter { .. } => Opcode::GetCharacter,
            Command::SwitchCharacter { .. } => Opcode::SwitchCharacter,
        }
    }

    /// Build a request frame for this command (used by tests and host tools)
    pub fn to_request(&self) -> Result<Request, FrameError> {
        let mut payload = [0u8; PAYLOAD_SIZE];
        match self {
            Command::GetAction { index } | Command::GetCharacter { index } => {
                payload[..2].copy_from_slice(&index.to_le_bytes());
            }
            Command::GetActionDisplayName { id } | Command::InvokeAction { id } => {
                write_str(&mut payload, id);
            }
            Command::SwitchCharacter { name } => {
                write_str(&mut payload, name);
            }
        }
        Request::new(self.opcode().to_byte(), &payload)
    }
}
