//! Shared type definitions for the werewolf orchestration engine.
//!
//! Everything that crosses a crate or process boundary lives here: ids,
//! role and phase enums, participant records, the typed event stream and
//! the resumable snapshot. Types flow to `TypeScript` via `ts-rs` for the
//! observer front end.
//!
//! # Modules
//!
//! - [`ids`] -- [`GameId`] and seat-number [`PlayerId`]
//! - [`enums`] -- Roles, factions, phases, death causes, decision kinds
//! - [`structs`] -- Participants, death records, leadership, night intents
//! - [`events`] -- [`GameEvent`] and its sequenced [`EventRecord`] wrapper
//! - [`snapshot`] -- [`GameSnapshot`] for crash-safe resume

pub mod enums;
pub mod events;
pub mod ids;
pub mod snapshot;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    DeathCause, DecisionKind, Faction, GameStatus, InspectionResult, Phase, Role, SpeechKind,
    SubPhase, Winner,
};
pub use events::{EventRecord, GameEvent};
pub use ids::{GameId, PlayerId};
pub use snapshot::GameSnapshot;
pub use structs::{DeathRecord, Leadership, NightIntents, Participant, SpeechOrder, VoteTally};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::GameId::export_all();
        let _ = crate::ids::PlayerId::export_all();

        // Enums
        let _ = crate::enums::Faction::export_all();
        let _ = crate::enums::Role::export_all();
        let _ = crate::enums::Phase::export_all();
        let _ = crate::enums::SubPhase::export_all();
        let _ = crate::enums::DeathCause::export_all();
        let _ = crate::enums::Winner::export_all();
        let _ = crate::enums::GameStatus::export_all();
        let _ = crate::enums::InspectionResult::export_all();
        let _ = crate::enums::DecisionKind::export_all();
        let _ = crate::enums::SpeechKind::export_all();

        // Structs
        let _ = crate::structs::Participant::export_all();
        let _ = crate::structs::DeathRecord::export_all();
        let _ = crate::structs::Leadership::export_all();
        let _ = crate::structs::NightIntents::export_all();
        let _ = crate::structs::SpeechOrder::export_all();
        let _ = crate::structs::VoteTally::export_all();

        // Events and snapshot
        let _ = crate::events::GameEvent::export_all();
        let _ = crate::events::EventRecord::export_all();
        let _ = crate::snapshot::GameSnapshot::export_all();
    }
}
