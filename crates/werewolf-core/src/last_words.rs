//! Who may give a final statement.

use werewolf_types::DeathCause;

/// Whether a death by `cause` in `round` grants last words.
///
/// Exile, self-destruct and the Hunter's shot always do. The wolf kill does
/// only on round 1. Poison never does.
pub const fn has_last_words(cause: DeathCause, round: u32) -> bool {
    match cause {
        DeathCause::VoteExile | DeathCause::SelfDestruct | DeathCause::RetaliationShot => true,
        DeathCause::WolfKill => round == 1,
        DeathCause::Poison => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wolf_kill_only_on_first_round() {
        assert!(has_last_words(DeathCause::WolfKill, 1));
        assert!(!has_last_words(DeathCause::WolfKill, 2));
        assert!(!has_last_words(DeathCause::WolfKill, 9));
    }

    #[test]
    fn poison_never() {
        assert!(!has_last_words(DeathCause::Poison, 1));
        assert!(!has_last_words(DeathCause::Poison, 3));
    }

    #[test]
    fn day_deaths_always() {
        for round in [1, 2, 15] {
            assert!(has_last_words(DeathCause::VoteExile, round));
            assert!(has_last_words(DeathCause::SelfDestruct, round));
            assert!(has_last_words(DeathCause::RetaliationShot, round));
        }
    }
}
