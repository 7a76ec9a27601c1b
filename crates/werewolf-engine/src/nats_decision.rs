//! NATS-backed decision port.
//!
//! [`NatsDecisionPort`] implements [`DecisionPort`] with one NATS
//! request/reply per question: the serialized [`DecisionRequest`] goes to
//! `{prefix}.{game_id}.decide.{seat}` and the agent runner answers with a
//! JSON object of decision fields.
//!
//! The port enforces its own deadline. A late, missing or unparsable reply
//! becomes a [`DecisionError`], which the engine turns into the neutral
//! default for the question, so a dead agent slows the game down but never
//! stalls it.

use std::time::Duration;

use async_nats::RequestErrorKind;
use tracing::debug;
use werewolf_core::decision::{Decision, DecisionError, DecisionPort, DecisionRequest};

use crate::subjects;

/// Decision port that asks external agents over NATS.
pub struct NatsDecisionPort {
    /// The NATS client connection.
    client: async_nats::Client,
    /// Subject prefix shared with the agent runner.
    prefix: String,
    /// Maximum time to wait for one reply.
    timeout: Duration,
}

impl NatsDecisionPort {
    /// Create a port on an already connected client.
    pub const fn new(client: async_nats::Client, prefix: String, timeout: Duration) -> Self {
        Self {
            client,
            prefix,
            timeout,
        }
    }

    fn deadline_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl std::fmt::Debug for NatsDecisionPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsDecisionPort")
            .field("prefix", &self.prefix)
            .field("timeout_ms", &self.timeout.as_millis())
            .finish_non_exhaustive()
    }
}

impl DecisionPort for NatsDecisionPort {
    async fn decide(&mut self, request: &DecisionRequest) -> Result<Decision, DecisionError> {
        let subject = subjects::decide(&self.prefix, request.game_id, request.player);
        let payload = serde_json::to_vec(request).map_err(|e| DecisionError::Transport {
            message: format!("failed to serialize request for player {}: {e}", request.player),
        })?;

        let timed_out = DecisionError::Timeout {
            player: request.player,
            kind: request.kind,
            deadline_ms: self.deadline_ms(),
        };
        debug!(subject = subject, kind = %request.kind, "Requesting decision");
        let reply = match tokio::time::timeout(
            self.timeout,
            self.client.request(subject.clone(), payload.into()),
        )
        .await
        {
            Ok(Ok(message)) => message,
            Ok(Err(e)) if e.kind() == RequestErrorKind::TimedOut => return Err(timed_out),
            Ok(Err(e)) => {
                return Err(DecisionError::Transport {
                    message: format!("request on {subject} failed: {e}"),
                });
            }
            Err(_elapsed) => return Err(timed_out),
        };

        parse_reply(&reply.payload)
    }
}

/// Decode an agent's reply; it must be a JSON object.
fn parse_reply(payload: &[u8]) -> Result<Decision, DecisionError> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|e| DecisionError::Malformed {
            message: format!("reply is not JSON: {e}"),
        })?;
    if !value.is_object() {
        return Err(DecisionError::Malformed {
            message: format!("reply is not an object: {value}"),
        });
    }
    Ok(Decision::from_value(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use werewolf_core::decision::fields;
    use werewolf_types::{DecisionKind, GameId, PlayerId, Role};

    use super::*;

    #[test]
    fn object_reply_becomes_decision() {
        let decision = parse_reply(br#"{"target": 4, "rationale": "quiet"}"#).unwrap();
        assert_eq!(decision.target(fields::TARGET, &[PlayerId(4)]), Some(PlayerId(4)));
        assert_eq!(decision.text(fields::RATIONALE), Some("quiet"));
    }

    #[test]
    fn non_object_reply_is_malformed() {
        assert!(matches!(
            parse_reply(b"[1, 2]"),
            Err(DecisionError::Malformed { .. })
        ));
        assert!(matches!(
            parse_reply(b"not json"),
            Err(DecisionError::Malformed { .. })
        ));
    }

    /// Requires a live NATS server with no responder on the subject.
    #[tokio::test]
    #[ignore]
    async fn unanswered_request_fails_fast() {
        let client = async_nats::connect("nats://localhost:4222").await.unwrap();
        let mut port = NatsDecisionPort::new(
            client,
            String::from("werewolf-test"),
            Duration::from_millis(200),
        );
        let request = DecisionRequest {
            game_id: GameId::new(),
            round: 1,
            player: PlayerId(4),
            role: Role::Guard,
            kind: DecisionKind::GuardProtect,
            options: vec![PlayerId(1)],
            context: serde_json::json!({}),
            memory: String::new(),
        };
        let result = port.decide(&request).await;
        assert!(matches!(
            result,
            Err(DecisionError::Timeout { .. } | DecisionError::Transport { .. })
        ));
    }
}
