//! Command dispatcher
//!
//! Maps companion app requests onto machine queries and mutations. Every
//! request that survives frame decoding gets exactly one response.

use embedded_hal_async::delay::DelayNs;

use critter_protocol::{Command, CommandError, FrameError, Request, Response};

use crate::state::CharacterMachine;
use crate::traits::{AssetStorage, Clock};

const UNKNOWN_ACTION: &str = "Unknown action";
const UNKNOWN_CHARACTER: &str = "Unknown character";

/// Handle raw characteristic bytes
///
/// Returns `None` for frames that must be dropped without a response.
pub async fn handle_frame<S: AssetStorage, C: Clock, D: DelayNs>(
    machine: &CharacterMachine<'_, S, C>,
    bytes: &[u8],
    delay: &mut D,
) -> Option<Response> {
    match Request::decode(bytes) {
        Ok(request) => Some(handle(machine, &request, delay).await),
        Err(FrameError::WrongMagic) => {
            trace!("dropping frame with wrong magic");
            None
        }
        Err(e) => {
            debug!("dropping frame: {}", e);
            None
        }
    }
}

/// Handle one decoded request
pub async fn handle<S: AssetStorage, C: Clock, D: DelayNs>(
    machine: &CharacterMachine<'_, S, C>,
    request: &Request,
    delay: &mut D,
) -> Response {
    let op = request.opcode;
    let command = match Command::from_request(request) {
        Ok(command) => command,
        Err(CommandError::UnknownOpcode(byte)) => {
            warn!("unknown opcode {}", byte);
            return Response::empty(false, op);
        }
        Err(CommandError::InvalidString) => return Response::failure(op, "Invalid string"),
    };
    debug!("command {}", command.opcode().to_byte());

    match command {
        Command::GetAction { index } => match machine.action_id_at(usize::from(index)) {
            Some(id) => Response::success(op, &id),
            None => Response::failure(op, UNKNOWN_ACTION),
        },
        Command::GetActionDisplayName { id } => match machine.action_display(id) {
            Some(display) => Response::success(op, &display),
            None => Response::failure(op, UNKNOWN_ACTION),
        },
        Command::InvokeAction { id } => match machine.invoke_action(id) {
            Ok(()) => Response::empty(true, op),
            Err(_) => Response::failure(op, UNKNOWN_ACTION),
        },
        Command::GetCharacter { index } => match machine.library().list_characters().await {
            Ok(ids) => match ids.get(usize::from(index)) {
                Some(id) => Response::success(op, id),
                None => Response::failure(op, UNKNOWN_CHARACTER),
            },
            Err(e) => {
                warn!("listing characters failed: {}", e);
                Response::failure(op, UNKNOWN_CHARACTER)
            }
        },
        Command::SwitchCharacter { name } => switch_character(machine, op, name, delay).await,
    }
}

async fn switch_character<S: AssetStorage, C: Clock, D: DelayNs>(
    machine: &CharacterMachine<'_, S, C>,
    op: u8,
    id: &str,
    delay: &mut D,
) -> Response {
    let library = machine.library();
    let known = match library.list_characters().await {
        Ok(ids) => ids.iter().any(|known| known == id),
        Err(_) => false,
    };
    if !known {
        return Response::failure(op, UNKNOWN_CHARACTER);
    }

    if let Err(e) = library.select_character(id).await {
        warn!("selecting {} failed: {}", id, e);
    }
    match machine.load_character(id, delay).await {
        Ok(()) => Response::empty(true, op),
        Err(e) => {
            error!("switch to {} failed: {}", id, e);
            Response::failure(op, "Failed to load character")
        }
    }
}
