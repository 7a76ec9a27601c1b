//! Resumable game snapshot.
//!
//! A snapshot is written at every sub-phase boundary, before the sub-phase
//! runs. Restoring one rebuilds the entity store and resumes the phase
//! engine at the recorded sub-phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{GameStatus, Phase, SubPhase, Winner};
use crate::ids::GameId;
use crate::structs::{DeathRecord, Leadership, NightIntents, Participant, SpeechOrder};

/// Serializable copy of a game's full state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameSnapshot {
    /// Game identifier.
    pub game_id: GameId,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Current round, starting at 1.
    pub round: u32,
    /// Current phase.
    pub phase: Phase,
    /// Sub-phase about to run, if any.
    pub sub_phase: Option<SubPhase>,
    /// All twelve participants in seat order.
    pub participants: Vec<Participant>,
    /// Death log in the order deaths were applied.
    pub deaths: Vec<DeathRecord>,
    /// Current leadership holder.
    pub leadership: Option<Leadership>,
    /// Today's speaking order, once computed.
    pub speech_order: Option<SpeechOrder>,
    /// Intents collected so far this night.
    pub night: NightIntents,
    /// Result, once the game has ended.
    pub winner: Option<Winner>,
    /// Sequence number the next emitted event will carry.
    pub next_sequence: u64,
    /// Wall-clock time the snapshot was taken.
    pub saved_at: DateTime<Utc>,
}
