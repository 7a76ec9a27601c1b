//! Sub-phase sequencing and the daily speaking order.
//!
//! The night always runs the same five steps; the day prepends the
//! leadership election on round 1 only. Steps whose role is dead are still
//! visited (and skipped by the engine) so the cursor never depends on who
//! is alive.

use rand::Rng;
use rand::seq::SliceRandom;
use werewolf_types::{PlayerId, SubPhase};

/// Night steps in execution order.
pub const NIGHT_ORDER: [SubPhase; 5] = [
    SubPhase::Guard,
    SubPhase::Wolf,
    SubPhase::Witch,
    SubPhase::Seer,
    SubPhase::Resolve,
];

const FIRST_DAY_ORDER: [SubPhase; 6] = [
    SubPhase::LeaderElection,
    SubPhase::AnnounceDeaths,
    SubPhase::LastWords,
    SubPhase::Discussion,
    SubPhase::Vote,
    SubPhase::ExileWords,
];

/// Day steps in execution order for `round`.
pub fn day_order(round: u32) -> &'static [SubPhase] {
    if round == 1 {
        &FIRST_DAY_ORDER
    } else {
        FIRST_DAY_ORDER.get(1..).unwrap_or(&[])
    }
}

/// The step after `current` within the same phase, or `None` when the
/// phase is over.
pub fn next_sub_phase(current: SubPhase, round: u32) -> Option<SubPhase> {
    let order: &[SubPhase] = match current.phase() {
        werewolf_types::Phase::Night => &NIGHT_ORDER,
        _ => day_order(round),
    };
    order
        .iter()
        .skip_while(|step| **step != current)
        .nth(1)
        .copied()
}

/// First day step for `round`.
pub fn first_day_step(round: u32) -> SubPhase {
    day_order(round)
        .first()
        .copied()
        .unwrap_or(SubPhase::AnnounceDeaths)
}

/// Compute the default speaking order for a day.
///
/// Round 1 is shuffled. Later rounds start with the first living seat after
/// the lowest-numbered overnight victim, wrapping past seat 12; with no
/// overnight victim they start at the lowest living seat. `alive` must be
/// ascending.
pub fn speaking_order<R: Rng + ?Sized>(
    alive: &[PlayerId],
    round: u32,
    overnight_dead: &[PlayerId],
    rng: &mut R,
) -> Vec<PlayerId> {
    let mut order = alive.to_vec();
    if round == 1 {
        order.shuffle(rng);
        return order;
    }
    let start = overnight_dead
        .iter()
        .min()
        .and_then(|first_dead| alive.iter().position(|id| id > first_dead))
        .unwrap_or(0);
    order.rotate_left(start);
    order
}

/// Whether `proposed` reorders exactly the seats in `current`.
pub fn is_permutation(proposed: &[PlayerId], current: &[PlayerId]) -> bool {
    if proposed.len() != current.len() {
        return false;
    }
    let mut a = proposed.to_vec();
    let mut b = current.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a.dedup();
    a == b
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn seats(ids: &[u8]) -> Vec<PlayerId> {
        ids.iter().copied().map(PlayerId).collect()
    }

    #[test]
    fn election_only_on_first_day() {
        assert_eq!(first_day_step(1), SubPhase::LeaderElection);
        assert_eq!(first_day_step(2), SubPhase::AnnounceDeaths);
        assert!(!day_order(3).contains(&SubPhase::LeaderElection));
    }

    #[test]
    fn sub_phases_advance_in_order() {
        assert_eq!(next_sub_phase(SubPhase::Guard, 1), Some(SubPhase::Wolf));
        assert_eq!(next_sub_phase(SubPhase::Seer, 4), Some(SubPhase::Resolve));
        assert_eq!(next_sub_phase(SubPhase::Resolve, 1), None);
        assert_eq!(
            next_sub_phase(SubPhase::LeaderElection, 1),
            Some(SubPhase::AnnounceDeaths)
        );
        assert_eq!(next_sub_phase(SubPhase::Vote, 2), Some(SubPhase::ExileWords));
        assert_eq!(next_sub_phase(SubPhase::ExileWords, 2), None);
    }

    #[test]
    fn later_days_start_after_first_victim() {
        let mut rng = StdRng::seed_from_u64(1);
        let alive = seats(&[1, 2, 4, 6, 9, 11]);
        let order = speaking_order(&alive, 2, &seats(&[5, 3]), &mut rng);
        assert_eq!(order, seats(&[4, 6, 9, 11, 1, 2]));
    }

    #[test]
    fn victim_in_last_seat_wraps_around() {
        let mut rng = StdRng::seed_from_u64(1);
        let alive = seats(&[2, 5, 7]);
        let order = speaking_order(&alive, 3, &seats(&[12]), &mut rng);
        assert_eq!(order, seats(&[2, 5, 7]));
    }

    #[test]
    fn peaceful_night_starts_at_lowest_seat() {
        let mut rng = StdRng::seed_from_u64(1);
        let alive = seats(&[3, 4, 8]);
        assert_eq!(speaking_order(&alive, 5, &[], &mut rng), alive);
    }

    #[test]
    fn first_day_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(9);
        let alive = seats(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        let order = speaking_order(&alive, 1, &[], &mut rng);
        assert!(is_permutation(&order, &alive));
    }

    #[test]
    fn permutation_check() {
        let current = seats(&[1, 2, 3]);
        assert!(is_permutation(&seats(&[3, 1, 2]), &current));
        assert!(!is_permutation(&seats(&[3, 3, 2]), &current));
        assert!(!is_permutation(&seats(&[1, 2]), &current));
        assert!(!is_permutation(&seats(&[1, 2, 4]), &current));
    }
}
