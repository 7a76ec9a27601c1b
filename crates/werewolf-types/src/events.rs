//! Typed game events emitted to observers.
//!
//! The engine wraps every [`GameEvent`] in an [`EventRecord`] carrying a
//! per-game sequence number, so an observer can detect gaps and replay a
//! game in order. Events serialize with an internal `type` tag.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{DecisionKind, DeathCause, InspectionResult, Phase, SpeechKind, SubPhase, Winner};
use crate::ids::{GameId, PlayerId};
use crate::structs::VoteTally;

/// Something observable that happened in a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GameEvent {
    /// The engine entered a new phase or sub-phase.
    PhaseChanged {
        /// New phase.
        phase: Phase,
        /// New sub-phase, if any.
        sub_phase: Option<SubPhase>,
    },
    /// A decision call is about to be made ("thinking" indicator).
    DecisionRequested {
        /// Participant being asked.
        player: PlayerId,
        /// What is being asked.
        kind: DecisionKind,
    },
    /// The Guard's choice for the night.
    GuardProtected {
        /// The Guard.
        guard: PlayerId,
        /// Protected participant, `None` if the Guard abstained.
        target: Option<PlayerId>,
    },
    /// One Werewolf proposal during kill negotiation.
    WolfProposal {
        /// Proposing Werewolf.
        wolf: PlayerId,
        /// Negotiation round, starting at 1.
        negotiation_round: u32,
        /// Proposed target, after substitution of invalid proposals.
        target: PlayerId,
        /// Stated rationale.
        rationale: String,
        /// Whether the agent's proposal was invalid and replaced at random.
        substituted: bool,
    },
    /// The faction's agreed kill.
    WolfKillChosen {
        /// Agreed target, `None` if the kill was abstained.
        target: Option<PlayerId>,
        /// Negotiation rounds used.
        negotiation_rounds: u32,
        /// `true` if agreed by consensus, `false` if forced.
        consensus: bool,
    },
    /// The Witch's choice for the night.
    WitchActed {
        /// The Witch.
        witch: PlayerId,
        /// Whether the heal was used.
        healed: bool,
        /// Poison target, if any.
        poison_target: Option<PlayerId>,
    },
    /// The Seer's inspection, revealed to the observer after resolution.
    SeerInspected {
        /// The Seer.
        seer: PlayerId,
        /// Inspected participant.
        target: PlayerId,
        /// What the Seer learned.
        result: InspectionResult,
    },
    /// The Guard protected the wolf kill target.
    KillBlocked {
        /// The protected participant.
        target: PlayerId,
    },
    /// The Werewolves did not kill anyone.
    EmptyKill,
    /// The heal canceled the wolf kill.
    Healed {
        /// The saved participant.
        target: PlayerId,
    },
    /// Nobody died during the night.
    PeacefulNight,
    /// A participant died.
    Death {
        /// Who died.
        player: PlayerId,
        /// Recorded cause.
        cause: DeathCause,
    },
    /// Morning announcement of overnight deaths.
    DeathsAnnounced {
        /// Overnight victims in seat order; empty on a peaceful night.
        dead: Vec<PlayerId>,
    },
    /// A participant spoke.
    Speech {
        /// Speaker.
        player: PlayerId,
        /// Context of the speech.
        kind: SpeechKind,
        /// What was said.
        content: String,
    },
    /// A Werewolf revealed itself and died, ending the day.
    SelfDestructed {
        /// The Werewolf.
        player: PlayerId,
    },
    /// One ballot in the main exile vote.
    VoteCast {
        /// Voter.
        voter: PlayerId,
        /// Chosen target, `None` for an abstention.
        target: Option<PlayerId>,
    },
    /// Outcome of the main exile vote.
    VoteResult {
        /// Weighted totals, highest first.
        tallies: Vec<VoteTally>,
        /// Exiled participant, if any.
        exiled: Option<PlayerId>,
        /// Whether the maximum was shared by several targets.
        tie: bool,
    },
    /// Leadership election opened.
    ElectionStarted,
    /// A participant's registration answer.
    RegistrationDecided {
        /// Participant.
        player: PlayerId,
        /// Whether they registered as a candidate.
        registered: bool,
    },
    /// The final candidate list, in registration order.
    CandidatesAnnounced {
        /// Candidates.
        candidates: Vec<PlayerId>,
    },
    /// One ballot in the leadership election.
    ElectionVoteCast {
        /// Voter.
        voter: PlayerId,
        /// Chosen candidate, `None` for an abstention.
        candidate: Option<PlayerId>,
    },
    /// Outcome of the leadership election.
    ElectionResult {
        /// Elected holder, `None` if nobody registered or the vote tied.
        leader: Option<PlayerId>,
        /// Unweighted totals, highest first.
        tallies: Vec<VoteTally>,
    },
    /// The dying holder passed the badge on.
    LeadershipTransferred {
        /// Previous holder.
        from: PlayerId,
        /// New holder.
        to: PlayerId,
    },
    /// The badge left the game.
    LeadershipDestroyed {
        /// Last holder.
        holder: PlayerId,
    },
    /// The day's speaking order.
    SpeechOrderSet {
        /// Living participants in speaking order.
        order: Vec<PlayerId>,
        /// Whether the holder replaced the computed order.
        overridden: bool,
    },
    /// A dying Hunter's shot.
    RetaliationShot {
        /// The Hunter.
        shooter: PlayerId,
        /// Shot participant, `None` if the Hunter held fire.
        target: Option<PlayerId>,
    },
    /// Terminal event: the game has a result.
    GameEnded {
        /// Result.
        winner: Winner,
        /// Round in which the game ended.
        rounds: u32,
    },
    /// Terminal event: the game stopped on an internal error.
    GameError {
        /// Error description.
        message: String,
    },
}

impl GameEvent {
    /// Whether nothing may follow this event.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::GameEnded { .. } | Self::GameError { .. })
    }
}

/// A [`GameEvent`] with its position in the game's event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventRecord {
    /// Game the event belongs to.
    pub game_id: GameId,
    /// Zero-based position in the stream; strictly increasing.
    pub sequence: u64,
    /// Round in which the event occurred.
    pub round: u32,
    /// The event.
    pub event: GameEvent,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_carry_type_tag() {
        let event = GameEvent::Death {
            player: PlayerId(5),
            cause: DeathCause::Poison,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "death");
        assert_eq!(json["player"], 5);
        assert_eq!(json["cause"], "poison");

        let unit = serde_json::to_value(GameEvent::PeacefulNight).unwrap();
        assert_eq!(unit["type"], "peaceful_night");
    }

    #[test]
    fn record_roundtrips() {
        let record = EventRecord {
            game_id: GameId::new(),
            sequence: 3,
            round: 2,
            event: GameEvent::VoteResult {
                tallies: vec![VoteTally {
                    target: PlayerId(3),
                    half_votes: 5,
                }],
                exiled: Some(PlayerId(3)),
                tie: false,
            },
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn only_end_and_error_are_terminal() {
        assert!(GameEvent::GameError { message: String::from("x") }.is_terminal());
        assert!(
            GameEvent::GameEnded {
                winner: Winner::Draw,
                rounds: 21
            }
            .is_terminal()
        );
        assert!(!GameEvent::EmptyKill.is_terminal());
    }
}
