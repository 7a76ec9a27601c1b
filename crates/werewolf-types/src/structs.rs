//! Core entity structs: participants, deaths, leadership and per-night intents.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{DeathCause, Faction, InspectionResult, Role};
use crate::ids::PlayerId;

/// One seat at the table.
///
/// The faction is intentionally absent: it is always derived from
/// [`role`](Self::role) via [`Participant::faction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[allow(clippy::struct_excessive_bools)]
pub struct Participant {
    /// Seat number.
    pub id: PlayerId,
    /// Hidden role.
    pub role: Role,
    /// Whether the participant is still in the game.
    pub alive: bool,
    /// Whether the participant holds the leadership badge.
    pub is_leader: bool,
    /// Witch only: the heal has been spent.
    pub heal_used: bool,
    /// Witch only: the poison has been spent.
    pub poison_used: bool,
    /// Hunter only: the shot is still available.
    pub can_retaliate: bool,
    /// Guard only: last night's protection target.
    pub last_protected: Option<PlayerId>,
    /// Set once, when the participant dies.
    pub death_cause: Option<DeathCause>,
    /// Round of death, set together with `death_cause`.
    pub death_round: Option<u32>,
}

impl Participant {
    /// A living participant with fresh resources.
    pub const fn new(id: PlayerId, role: Role) -> Self {
        Self {
            id,
            role,
            alive: true,
            is_leader: false,
            heal_used: false,
            poison_used: false,
            can_retaliate: role.can_retaliate(),
            last_protected: None,
            death_cause: None,
            death_round: None,
        }
    }

    /// Alignment derived from the role.
    pub const fn faction(&self) -> Faction {
        self.role.faction()
    }

    /// Whether the participant belongs to the Wolf faction.
    pub const fn is_wolf(&self) -> bool {
        matches!(self.role.faction(), Faction::Wolf)
    }
}

/// Append-only record of one death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DeathRecord {
    /// Who died.
    pub player: PlayerId,
    /// Round of death.
    pub round: u32,
    /// Recorded cause.
    pub cause: DeathCause,
}

/// The current leadership holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Leadership {
    /// Badge holder.
    pub holder: PlayerId,
    /// Round in which the holder received the badge.
    pub elected_round: u32,
}

/// Everything decided during one night, consumed once by resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NightIntents {
    /// Guard's protection target.
    pub guard_target: Option<PlayerId>,
    /// Agreed wolf kill target; `None` means the kill was abstained.
    pub wolf_target: Option<PlayerId>,
    /// Witch used the heal on the visible victim.
    pub heal: bool,
    /// Witch's poison target.
    pub poison_target: Option<PlayerId>,
    /// Seer's inspection target.
    pub inspect_target: Option<PlayerId>,
    /// Filled in by resolution.
    pub inspect_result: Option<InspectionResult>,
}

impl NightIntents {
    /// Victim the Witch is shown: the wolf target, unless the Guard blocked it.
    pub fn visible_victim(&self) -> Option<PlayerId> {
        match (self.wolf_target, self.guard_target) {
            (Some(target), Some(guarded)) if target == guarded => None,
            (target, _) => target,
        }
    }
}

/// Order of discussion speeches for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpeechOrder {
    /// Day this order belongs to.
    pub round: u32,
    /// Living participants in speaking order.
    pub order: Vec<PlayerId>,
    /// Whether the leadership holder replaced the computed order.
    pub overridden: bool,
}

/// Weighted total for one target.
///
/// Weights are counted in half-votes so that the holder's 1.5 weight stays
/// exact: a normal vote is 2, the holder's main-vote ballot is 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VoteTally {
    /// Voted-for participant.
    pub target: PlayerId,
    /// Sum of weights, in half-votes.
    pub half_votes: u32,
}
