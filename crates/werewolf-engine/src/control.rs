//! Operator control over NATS.
//!
//! Messages on `{prefix}.{game_id}.control` pause or resume the game. The
//! payload is either the bare word (`pause`, `resume`) or a JSON object
//! such as `{"command": "pause"}`. Anything else is logged and ignored.

use std::sync::Arc;

use futures::StreamExt as _;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use werewolf_core::operator::OperatorState;

use crate::error::AppError;

/// An operator instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    /// Stop before the next decision call.
    Pause,
    /// Continue a paused game.
    Resume,
}

#[derive(Deserialize)]
struct Envelope {
    command: ControlCommand,
}

/// Decode a control payload.
pub fn parse_command(payload: &[u8]) -> Option<ControlCommand> {
    if let Ok(Envelope { command }) = serde_json::from_slice::<Envelope>(payload) {
        return Some(command);
    }
    match std::str::from_utf8(payload).ok()?.trim().to_ascii_lowercase().as_str() {
        "pause" => Some(ControlCommand::Pause),
        "resume" => Some(ControlCommand::Resume),
        _ => None,
    }
}

/// Apply `command` to the shared pause flag.
pub fn apply(operator: &OperatorState, command: ControlCommand) {
    match command {
        ControlCommand::Pause => operator.pause(),
        ControlCommand::Resume => operator.resume(),
    }
    info!(?command, paused = operator.is_paused(), "Operator command applied");
}

/// Subscribe to `subject` and apply every command to `operator`.
///
/// # Errors
///
/// Returns [`AppError::Nats`] if the subscription fails.
pub async fn spawn_control_listener(
    client: &async_nats::Client,
    subject: String,
    operator: Arc<OperatorState>,
) -> Result<JoinHandle<()>, AppError> {
    let mut subscriber = client
        .subscribe(subject.clone())
        .await
        .map_err(|e| AppError::Nats {
            message: format!("failed to subscribe to {subject}: {e}"),
        })?;
    info!(subject = subject, "Listening for operator commands");

    Ok(tokio::spawn(async move {
        while let Some(message) = subscriber.next().await {
            match parse_command(&message.payload) {
                Some(command) => apply(&operator, command),
                None => warn!(
                    subject = subject,
                    payload = %String::from_utf8_lossy(&message.payload),
                    "Unrecognized operator command"
                ),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_words_and_json_both_parse() {
        assert_eq!(parse_command(b"pause"), Some(ControlCommand::Pause));
        assert_eq!(parse_command(b" Resume\n"), Some(ControlCommand::Resume));
        assert_eq!(
            parse_command(br#"{"command": "pause"}"#),
            Some(ControlCommand::Pause)
        );
        assert_eq!(parse_command(b"stop"), None);
        assert_eq!(parse_command(br#"{"command": "stop"}"#), None);
        assert_eq!(parse_command(&[0xff, 0xfe]), None);
    }

    #[test]
    fn commands_toggle_the_flag() {
        let operator = OperatorState::new();
        apply(&operator, ControlCommand::Pause);
        assert!(operator.is_paused());
        apply(&operator, ControlCommand::Resume);
        assert!(!operator.is_paused());
    }
}
