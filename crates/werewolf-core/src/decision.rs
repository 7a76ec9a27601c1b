//! Decision port and built-in implementations.
//!
//! Every move in the game comes from a [`DecisionPort`]: the engine sends a
//! [`DecisionRequest`] naming the participant, the question
//! ([`DecisionKind`]) and the valid options, and receives a loosely typed
//! [`Decision`] map back. The engine never trusts that map: each accessor
//! validates against the options it was given, and anything missing or out
//! of range is treated as "no decision".
//!
//! - [`RandomDecisionPort`] -- seeded random agents, used for local runs.
//! - [`ScriptedDecisionPort`] -- canned answers plus a request log, used in
//!   tests.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use werewolf_types::{DecisionKind, GameId, PlayerId, Role};

/// Field names the engine reads from a [`Decision`].
pub mod fields {
    /// Chosen participant (guard, seer, wolf proposal, retaliation).
    pub const TARGET: &str = "target";
    /// Chosen participant in a vote.
    pub const VOTE_TARGET: &str = "vote_target";
    /// Nominated badge successor.
    pub const SUCCESSOR: &str = "successor";
    /// Free-text speech.
    pub const SPEECH: &str = "speech";
    /// Werewolf self-destruct during discussion.
    pub const EXPLODE: &str = "explode";
    /// Run for leadership.
    pub const REGISTER: &str = "register";
    /// Witch uses the heal.
    pub const HEAL: &str = "heal";
    /// Witch's poison target.
    pub const POISON_TARGET: &str = "poison_target";
    /// Reasoning behind a wolf proposal.
    pub const RATIONALE: &str = "rationale";
    /// Holder's replacement speaking order.
    pub const ORDER: &str = "order";
}

/// Errors a decision port may report.
///
/// The engine never aborts on these; it logs them and substitutes the
/// neutral default for the question asked.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The agent did not answer within the port's deadline.
    #[error("player {player} timed out on {kind} (deadline: {deadline_ms}ms)")]
    Timeout {
        /// The participant asked.
        player: PlayerId,
        /// The question.
        kind: DecisionKind,
        /// The deadline in milliseconds.
        deadline_ms: u64,
    },

    /// The transport to the agent failed.
    #[error("decision transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The agent answered with something that is not a decision map.
    #[error("malformed decision: {message}")]
    Malformed {
        /// Description of the problem.
        message: String,
    },
}

/// One question to one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Game being played.
    pub game_id: GameId,
    /// Current round.
    pub round: u32,
    /// Participant being asked.
    pub player: PlayerId,
    /// The participant's own role.
    pub role: Role,
    /// What is being asked; also the phase tag.
    pub kind: DecisionKind,
    /// Valid participant choices for this question, ascending.
    pub options: Vec<PlayerId>,
    /// Question-specific context (victim, transcript, candidates, ...).
    pub context: Value,
    /// The participant's private memory summary.
    pub memory: String,
}

/// An agent's answer: a loosely typed field map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Decision(Map<String, Value>);

impl Decision {
    /// An empty decision (every field absent).
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value; anything but an object becomes an empty decision.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    /// Whether no field is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A seat number field, accepted only if it is in `valid`.
    pub fn target(&self, key: &str, valid: &[PlayerId]) -> Option<PlayerId> {
        self.0
            .get(key)
            .and_then(parse_seat)
            .filter(|seat| valid.contains(seat))
    }

    /// Whether `key` is present and explicitly `null`.
    pub fn abstains(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(Value::Null))
    }

    /// A boolean field. Accepts `true`, `"true"` and `"yes"`; anything else
    /// is `false`.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
            }
            _ => false,
        }
    }

    /// A non-blank text field.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// A list of seat numbers. `None` if absent or if any entry is not a seat.
    pub fn order(&self, key: &str) -> Option<Vec<PlayerId>> {
        self.0
            .get(key)?
            .as_array()?
            .iter()
            .map(parse_seat)
            .collect()
    }
}

fn parse_seat(value: &Value) -> Option<PlayerId> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()).map(PlayerId),
        Value::String(s) => s.trim().parse::<u8>().ok().map(PlayerId),
        _ => None,
    }
}

/// A source of participant decisions.
///
/// Called once per question with exactly one call outstanding at a time.
/// Implementations may retry or degrade internally; an `Err` means no
/// usable answer.
pub trait DecisionPort {
    /// Answer one question.
    fn decide(
        &mut self,
        request: &DecisionRequest,
    ) -> impl Future<Output = Result<Decision, DecisionError>>;
}

// ---------------------------------------------------------------------------
// Random port
// ---------------------------------------------------------------------------

/// Seeded random agents.
///
/// Picks uniformly among the offered options, registers for leadership
/// about 40% of the time, uses potions sparingly and almost never
/// self-destructs.
#[derive(Debug, Clone)]
pub struct RandomDecisionPort {
    rng: StdRng,
}

impl RandomDecisionPort {
    /// Create a port with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, request: &DecisionRequest) -> Decision {
        let choice = request.options.choose(&mut self.rng).map(|p| p.seat());
        let context_flag = |key: &str| {
            request
                .context
                .get(key)
                .and_then(Value::as_bool)
                .unwrap_or(false)
        };
        let speech = format!(
            "Player {} ({}) has nothing more to add this round.",
            request.player, request.kind
        );

        match request.kind {
            DecisionKind::GuardProtect | DecisionKind::SeerInspect | DecisionKind::RetaliationShot => {
                with_seat(Decision::new(), fields::TARGET, choice)
            }
            DecisionKind::WolfProposal => with_seat(Decision::new(), fields::TARGET, choice)
                .with(fields::RATIONALE, "They have been too quiet."),
            DecisionKind::WitchPotion => {
                let heal = context_flag("can_heal") && self.rng.random_bool(0.5);
                let poison = if context_flag("can_poison") && self.rng.random_bool(0.15) {
                    choice
                } else {
                    None
                };
                with_seat(Decision::new().with(fields::HEAL, heal), fields::POISON_TARGET, poison)
            }
            DecisionKind::LeaderRegister => {
                Decision::new().with(fields::REGISTER, self.rng.random_bool(0.4))
            }
            DecisionKind::LeaderSpeech | DecisionKind::LastWords => {
                Decision::new().with(fields::SPEECH, speech)
            }
            DecisionKind::DaySpeech => {
                let explode = context_flag("can_self_destruct") && self.rng.random_bool(0.03);
                Decision::new()
                    .with(fields::SPEECH, speech)
                    .with(fields::EXPLODE, explode)
            }
            DecisionKind::LeaderVote | DecisionKind::ExileVote => {
                with_seat(Decision::new(), fields::VOTE_TARGET, choice)
            }
            DecisionKind::LeaderSuccession => with_seat(Decision::new(), fields::SUCCESSOR, choice),
            DecisionKind::LeaderSpeechOrder => Decision::new(),
        }
    }
}

fn with_seat(decision: Decision, key: &str, seat: Option<u8>) -> Decision {
    match seat {
        Some(seat) => decision.with(key, seat),
        None => decision,
    }
}

impl DecisionPort for RandomDecisionPort {
    async fn decide(&mut self, request: &DecisionRequest) -> Result<Decision, DecisionError> {
        Ok(self.pick(request))
    }
}

// ---------------------------------------------------------------------------
// Scripted port
// ---------------------------------------------------------------------------

/// Computes an answer from the request.
pub type Responder = Box<dyn Fn(&DecisionRequest) -> Decision + Send>;

/// Canned answers for tests and replays.
///
/// Lookup order per request: the queue for (player, kind), then the
/// responder registered for the kind, then an empty decision. Every
/// request is logged.
#[derive(Default)]
pub struct ScriptedDecisionPort {
    queued: BTreeMap<(PlayerId, DecisionKind), VecDeque<Option<Decision>>>,
    responders: BTreeMap<DecisionKind, Responder>,
    seen: Vec<DecisionRequest>,
}

impl ScriptedDecisionPort {
    /// A port that answers everything with an empty decision.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `decision` as `player`'s next answer to `kind`.
    #[must_use]
    pub fn script(mut self, player: PlayerId, kind: DecisionKind, decision: Decision) -> Self {
        self.queued
            .entry((player, kind))
            .or_default()
            .push_back(Some(decision));
        self
    }

    /// Queue a transport failure as `player`'s next answer to `kind`.
    #[must_use]
    pub fn fail(mut self, player: PlayerId, kind: DecisionKind) -> Self {
        self.queued.entry((player, kind)).or_default().push_back(None);
        self
    }

    /// Answer every otherwise unscripted `kind` question with `responder`.
    #[must_use]
    pub fn respond(
        mut self,
        kind: DecisionKind,
        responder: impl Fn(&DecisionRequest) -> Decision + Send + 'static,
    ) -> Self {
        self.responders.insert(kind, Box::new(responder));
        self
    }

    /// Every request received, in order.
    pub fn requests(&self) -> &[DecisionRequest] {
        &self.seen
    }
}

impl std::fmt::Debug for ScriptedDecisionPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedDecisionPort")
            .field("queued", &self.queued.len())
            .field("responders", &self.responders.len())
            .field("seen", &self.seen.len())
            .finish()
    }
}

impl DecisionPort for ScriptedDecisionPort {
    async fn decide(&mut self, request: &DecisionRequest) -> Result<Decision, DecisionError> {
        self.seen.push(request.clone());
        let queued = self
            .queued
            .get_mut(&(request.player, request.kind))
            .and_then(VecDeque::pop_front);
        match queued {
            Some(Some(decision)) => Ok(decision),
            Some(None) => Err(DecisionError::Transport {
                message: format!("scripted failure for {} on {}", request.player, request.kind),
            }),
            None => Ok(self
                .responders
                .get(&request.kind)
                .map(|respond| respond(request))
                .unwrap_or_default()),
        }
    }
}
