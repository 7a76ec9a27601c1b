//! Enumeration types for the werewolf engine.
//!
//! Role behavior is attached to [`Role`] as per-variant attributes so that
//! callers dispatch with `match` instead of looking roles up in tables.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Roles and factions
// ---------------------------------------------------------------------------

/// One of the two opposed alignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Faction {
    /// Seer, Witch, Hunter, Guard and Villagers.
    Good,
    /// The Werewolves.
    Wolf,
}

/// A hidden role dealt to a participant at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Role {
    /// Inspects one participant's alignment each night.
    Seer,
    /// Holds one heal and one poison for the whole game.
    Witch,
    /// Shoots one participant when killed, unless poisoned.
    Hunter,
    /// Protects one participant each night, never the same one twice in a row.
    Guard,
    /// No ability.
    Villager,
    /// Joins the nightly joint kill.
    Werewolf,
}

impl Role {
    /// The twelve-seat deal: one of each Good specialist, four Villagers,
    /// four Werewolves.
    pub const STANDARD_DEAL: [Self; 12] = [
        Self::Seer,
        Self::Witch,
        Self::Hunter,
        Self::Guard,
        Self::Villager,
        Self::Villager,
        Self::Villager,
        Self::Villager,
        Self::Werewolf,
        Self::Werewolf,
        Self::Werewolf,
        Self::Werewolf,
    ];

    /// Every role kind, in deal order.
    pub const ALL: [Self; 6] = [
        Self::Seer,
        Self::Witch,
        Self::Hunter,
        Self::Guard,
        Self::Villager,
        Self::Werewolf,
    ];

    /// Alignment of this role. Never stored; always derived.
    pub const fn faction(self) -> Faction {
        match self {
            Self::Werewolf => Faction::Wolf,
            Self::Seer | Self::Witch | Self::Hunter | Self::Guard | Self::Villager => {
                Faction::Good
            }
        }
    }

    /// Whether the role takes a decision during the night.
    pub const fn has_night_action(self) -> bool {
        matches!(self, Self::Seer | Self::Witch | Self::Guard | Self::Werewolf)
    }

    /// Whether the role may shoot someone when it dies.
    pub const fn can_retaliate(self) -> bool {
        matches!(self, Self::Hunter)
    }

    /// Good-faction role with an ability (everything Good but Villager).
    pub const fn is_special(self) -> bool {
        matches!(self, Self::Seer | Self::Witch | Self::Hunter | Self::Guard)
    }

    /// Number of seats this role takes in the standard deal.
    pub const fn standard_count(self) -> usize {
        match self {
            Self::Seer | Self::Witch | Self::Hunter | Self::Guard => 1,
            Self::Villager | Self::Werewolf => 4,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Seer => "Seer",
            Self::Witch => "Witch",
            Self::Hunter => "Hunter",
            Self::Guard => "Guard",
            Self::Villager => "Villager",
            Self::Werewolf => "Werewolf",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Top-level game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Phase {
    /// Roles dealt, nothing has happened yet.
    Start,
    /// Night actions and resolution.
    Night,
    /// Announcements, discussion and the exile vote.
    Day,
    /// A result has been recorded.
    End,
}

/// A step within the night or the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SubPhase {
    /// Guard chooses whom to protect.
    Guard,
    /// Werewolves negotiate the joint kill.
    Wolf,
    /// Witch decides on heal and poison.
    Witch,
    /// Seer inspects one participant.
    Seer,
    /// Night intents are resolved into deaths.
    Resolve,
    /// Round-one election of the leadership holder.
    LeaderElection,
    /// Overnight deaths are announced.
    AnnounceDeaths,
    /// Overnight victims speak (if eligible) and death triggers run.
    LastWords,
    /// Each living participant speaks once.
    Discussion,
    /// The main exile vote.
    Vote,
    /// The exiled participant's final statement and death triggers.
    ExileWords,
}

impl SubPhase {
    /// The phase this step belongs to.
    pub const fn phase(self) -> Phase {
        match self {
            Self::Guard | Self::Wolf | Self::Witch | Self::Seer | Self::Resolve => Phase::Night,
            Self::LeaderElection
            | Self::AnnounceDeaths
            | Self::LastWords
            | Self::Discussion
            | Self::Vote
            | Self::ExileWords => Phase::Day,
        }
    }
}

// ---------------------------------------------------------------------------
// Deaths and results
// ---------------------------------------------------------------------------

/// Why a participant died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DeathCause {
    /// The Werewolves' joint kill.
    WolfKill,
    /// The Witch's poison.
    Poison,
    /// Exiled by the day vote.
    VoteExile,
    /// A Werewolf revealed itself and died during discussion.
    SelfDestruct,
    /// Shot by a dying Hunter.
    RetaliationShot,
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::WolfKill => "killed by the werewolves",
            Self::Poison => "poisoned",
            Self::VoteExile => "exiled by vote",
            Self::SelfDestruct => "self-destructed",
            Self::RetaliationShot => "shot by the hunter",
        };
        f.write_str(name)
    }
}

/// Final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Winner {
    /// Every Werewolf is dead.
    Good,
    /// All Good specialists or all Villagers are dead.
    Wolf,
    /// The round ceiling was passed without an extinction.
    Draw,
}

/// Lifecycle status of a game record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GameStatus {
    /// Dealt but not yet started.
    Created,
    /// The phase engine is advancing the game.
    Running,
    /// Ended with a [`Winner`].
    Finished,
    /// Ended by an internal error, without a winner.
    Failed,
}

/// What the Seer learns about a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum InspectionResult {
    /// The target belongs to the Wolf faction.
    Wolf,
    /// The target does not belong to the Wolf faction.
    NotWolf,
}

// ---------------------------------------------------------------------------
// Decisions and speech
// ---------------------------------------------------------------------------

/// The question put to an agent. Doubles as the phase tag of a decision
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DecisionKind {
    /// Guard picks a protection target.
    GuardProtect,
    /// A Werewolf proposes a kill target during negotiation.
    WolfProposal,
    /// Witch decides on heal and poison.
    WitchPotion,
    /// Seer picks an inspection target.
    SeerInspect,
    /// Whether to run for leadership.
    LeaderRegister,
    /// Candidate campaign speech.
    LeaderSpeech,
    /// Vote for a candidate.
    LeaderVote,
    /// Dying holder nominates a successor.
    LeaderSuccession,
    /// Holder reorders the day's speeches.
    LeaderSpeechOrder,
    /// Discussion speech (Werewolves may self-destruct here).
    DaySpeech,
    /// Main exile vote.
    ExileVote,
    /// Final statement.
    LastWords,
    /// Dying Hunter picks a target.
    RetaliationShot,
}

impl DecisionKind {
    /// Stable tag used in message subjects and logs.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::GuardProtect => "guard_protect",
            Self::WolfProposal => "wolf_proposal",
            Self::WitchPotion => "witch_potion",
            Self::SeerInspect => "seer_inspect",
            Self::LeaderRegister => "leader_register",
            Self::LeaderSpeech => "leader_speech",
            Self::LeaderVote => "leader_vote",
            Self::LeaderSuccession => "leader_succession",
            Self::LeaderSpeechOrder => "leader_speech_order",
            Self::DaySpeech => "day_speech",
            Self::ExileVote => "exile_vote",
            Self::LastWords => "last_words",
            Self::RetaliationShot => "retaliation_shot",
        }
    }
}

impl core::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Context in which a participant spoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SpeechKind {
    /// Leadership candidate's campaign speech.
    Campaign,
    /// Regular discussion turn.
    Discussion,
    /// Final statement of a dying participant.
    LastWords,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_deal_matches_role_counts() {
        for role in Role::ALL {
            let dealt = Role::STANDARD_DEAL.iter().filter(|r| **r == role).count();
            assert_eq!(dealt, role.standard_count(), "{role}");
        }
    }

    #[test]
    fn only_werewolves_are_wolf_faction() {
        for role in Role::ALL {
            assert_eq!(role.faction() == Faction::Wolf, role == Role::Werewolf);
        }
    }

    #[test]
    fn role_attributes() {
        assert!(Role::Hunter.can_retaliate());
        assert!(!Role::Hunter.has_night_action());
        assert!(!Role::Villager.is_special());
        assert!(!Role::Werewolf.is_special());
        assert!(Role::Guard.is_special());
        assert!(Role::Werewolf.has_night_action());
    }

    #[test]
    fn sub_phases_know_their_phase() {
        assert_eq!(SubPhase::Resolve.phase(), Phase::Night);
        assert_eq!(SubPhase::LeaderElection.phase(), Phase::Day);
        assert_eq!(SubPhase::ExileWords.phase(), Phase::Day);
    }

    #[test]
    fn decision_kind_tag_matches_serde() {
        let json = serde_json::to_string(&DecisionKind::LeaderSpeechOrder).ok();
        assert_eq!(json.as_deref(), Some("\"leader_speech_order\""));
        assert_eq!(DecisionKind::LeaderSpeechOrder.tag(), "leader_speech_order");
    }
}
