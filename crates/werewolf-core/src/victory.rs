//! Victory evaluation.
//!
//! Good wins when no Werewolf is alive. The Wolves win when every Good
//! specialist is dead or every Villager is dead. When both hold after the
//! same step the Wolves win.

use werewolf_types::{Faction, Role, Winner};

use crate::state::GameState;

/// Evaluate the extinction conditions. `None` means the game goes on.
pub fn check_victory(state: &GameState) -> Option<Winner> {
    let living = || state.participants().iter().filter(|p| p.alive);

    let wolves_alive = living().any(|p| p.faction() == Faction::Wolf);
    let specials_alive = living().any(|p| p.role.is_special());
    let villagers_alive = living().any(|p| p.role == Role::Villager);

    let wolf_win = !specials_alive || !villagers_alive;
    let good_win = !wolves_alive;

    if wolf_win {
        Some(Winner::Wolf)
    } else if good_win {
        Some(Winner::Good)
    } else {
        None
    }
}

/// Whether `round` is past the ceiling, which makes the game a draw.
pub const fn past_round_limit(round: u32, max_rounds: u32) -> bool {
    round > max_rounds
}
