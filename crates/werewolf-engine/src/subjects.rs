//! NATS subject naming.
//!
//! Every subject for a game lives under `{prefix}.{game_id}`:
//!
//! - **Decision request/reply:** `{prefix}.{game_id}.decide.{seat}`
//! - **Event stream:** `{prefix}.{game_id}.events`
//! - **Operator control:** `{prefix}.{game_id}.control`

use werewolf_types::{GameId, PlayerId};

/// Subject an agent for `player` answers decision requests on.
pub fn decide(prefix: &str, game_id: GameId, player: PlayerId) -> String {
    format!("{prefix}.{game_id}.decide.{player}")
}

/// Subject the event stream is published on.
pub fn events(prefix: &str, game_id: GameId) -> String {
    format!("{prefix}.{game_id}.events")
}

/// Subject pause/resume commands arrive on.
pub fn control(prefix: &str, game_id: GameId) -> String {
    format!("{prefix}.{game_id}.control")
}
