//! Night resolution.
//!
//! [`compute_night`] is a pure function of the collected [`NightIntents`]
//! and the current state; [`apply_night`] then writes the result into the
//! entity store. Nothing is mutated until the full outcome is known.
//!
//! Rules, in order:
//!
//! 1. Guard target equal to the wolf target blocks the kill.
//! 2. A heal cancels the remaining (provisional) kill.
//! 3. Poison always kills; it ignores protection and heal.
//! 4. Kill and poison on the same target record poison as the cause.
//! 5. Only living targets die, each exactly once.
//! 6. The Seer learns Wolf / not Wolf for the inspected target.

use werewolf_types::{DeathCause, DeathRecord, InspectionResult, NightIntents, PlayerId, Role};

use crate::state::{GameState, StateError};

/// Result of resolving one night, before it is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightOutcome {
    /// Kill target protected by the Guard.
    pub blocked: Option<PlayerId>,
    /// The Werewolves abstained.
    pub empty_kill: bool,
    /// Kill target saved by the heal.
    pub healed: Option<PlayerId>,
    /// Deaths in seat order, one per target.
    pub deaths: Vec<(PlayerId, DeathCause)>,
    /// Inspection target and what the Seer learns.
    pub inspection: Option<(PlayerId, InspectionResult)>,
}

/// Resolve `intents` against `state` without mutating anything.
pub fn compute_night(intents: &NightIntents, state: &GameState) -> NightOutcome {
    let mut outcome = NightOutcome {
        empty_kill: intents.wolf_target.is_none(),
        ..NightOutcome::default()
    };

    let mut provisional = intents.wolf_target;
    if let (Some(target), Some(guarded)) = (provisional, intents.guard_target) {
        if target == guarded {
            outcome.blocked = Some(target);
            provisional = None;
        }
    }
    if intents.heal {
        if let Some(target) = provisional.take() {
            outcome.healed = Some(target);
        }
    }

    let mut deaths: Vec<(PlayerId, DeathCause)> = Vec::new();
    if let Some(target) = provisional {
        deaths.push((target, DeathCause::WolfKill));
    }
    if let Some(target) = intents.poison_target {
        match deaths.iter_mut().find(|(id, _)| *id == target) {
            Some(entry) => entry.1 = DeathCause::Poison,
            None => deaths.push((target, DeathCause::Poison)),
        }
    }
    deaths.retain(|(id, _)| state.is_alive(*id));
    deaths.sort_by_key(|(id, _)| *id);
    outcome.deaths = deaths;

    outcome.inspection = intents.inspect_target.map(|target| {
        let result = if state.is_wolf(target) {
            InspectionResult::Wolf
        } else {
            InspectionResult::NotWolf
        };
        (target, result)
    });

    outcome
}

/// Write a computed outcome into the entity store.
///
/// Marks consumed potions on the Witch, records the inspection result in
/// the night intents and applies each death once. Returns the deaths that
/// were actually applied.
///
/// # Errors
///
/// Returns [`StateError`] if the outcome names a seat that does not exist.
pub fn apply_night(
    outcome: &NightOutcome,
    intents: &NightIntents,
    state: &mut GameState,
) -> Result<Vec<DeathRecord>, StateError> {
    let witch = state
        .participants()
        .iter()
        .find(|p| p.role == Role::Witch)
        .map(|p| p.id);
    if let Some(witch) = witch {
        if outcome.healed.is_some() {
            state.use_heal(witch)?;
        }
        if intents.poison_target.is_some() {
            state.use_poison(witch)?;
        }
    }

    state.night_mut().inspect_result = outcome.inspection.map(|(_, result)| result);

    let mut applied = Vec::with_capacity(outcome.deaths.len());
    for &(player, cause) in &outcome.deaths {
        if let Some(record) = state.kill(player, cause)? {
            applied.push(record);
        }
    }
    Ok(applied)
}

/// Compute and apply the current night's intents in one step.
///
/// # Errors
///
/// Returns [`StateError`] if the intents name a seat that does not exist.
pub fn resolve_night(state: &mut GameState) -> Result<(NightOutcome, Vec<DeathRecord>), StateError> {
    let intents = state.night().clone();
    let outcome = compute_night(&intents, state);
    let applied = apply_night(&outcome, &intents, state)?;
    Ok((outcome, applied))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::tests::fixed_state;

    const WITCH: PlayerId = PlayerId(2);
    const HUNTER: PlayerId = PlayerId(3);

    fn intents() -> NightIntents {
        NightIntents::default()
    }

    #[test]
    fn protection_blocks_kill() {
        let mut state = fixed_state();
        state.night_mut().wolf_target = Some(PlayerId(5));
        state.night_mut().guard_target = Some(PlayerId(5));
        let (outcome, applied) = resolve_night(&mut state).unwrap();
        assert_eq!(outcome.blocked, Some(PlayerId(5)));
        assert!(applied.is_empty());
        assert!(outcome.deaths.is_empty());
        assert!(state.is_alive(PlayerId(5)));
    }

    #[test]
    fn unrelated_protection_does_not_block() {
        let state = fixed_state();
        let night = NightIntents {
            wolf_target: Some(PlayerId(5)),
            guard_target: Some(PlayerId(6)),
            ..intents()
        };
        let outcome = compute_night(&night, &state);
        assert_eq!(outcome.blocked, None);
        assert_eq!(outcome.deaths, vec![(PlayerId(5), DeathCause::WolfKill)]);
    }

    #[test]
    fn heal_cancels_kill_and_is_consumed() {
        let mut state = fixed_state();
        state.night_mut().wolf_target = Some(PlayerId(6));
        state.night_mut().heal = true;
        let (outcome, applied) = resolve_night(&mut state).unwrap();
        assert_eq!(outcome.healed, Some(PlayerId(6)));
        assert!(applied.is_empty());
        assert!(state.participant(WITCH).unwrap().heal_used);
    }

    #[test]
    fn heal_after_block_is_not_consumed() {
        let mut state = fixed_state();
        state.night_mut().wolf_target = Some(PlayerId(6));
        state.night_mut().guard_target = Some(PlayerId(6));
        state.night_mut().heal = true;
        let (outcome, _) = resolve_night(&mut state).unwrap();
        assert_eq!(outcome.healed, None);
        assert!(!state.participant(WITCH).unwrap().heal_used);
    }

    #[test]
    fn poison_ignores_protection_and_heal() {
        let state = fixed_state();
        let night = NightIntents {
            wolf_target: Some(PlayerId(7)),
            guard_target: Some(PlayerId(8)),
            heal: true,
            poison_target: Some(PlayerId(8)),
            ..intents()
        };
        let outcome = compute_night(&night, &state);
        assert_eq!(outcome.healed, Some(PlayerId(7)));
        assert_eq!(outcome.deaths, vec![(PlayerId(8), DeathCause::Poison)]);
    }

    #[test]
    fn kill_and_poison_on_same_target_records_poison() {
        let mut state = fixed_state();
        state.night_mut().wolf_target = Some(HUNTER);
        state.night_mut().poison_target = Some(HUNTER);
        let (outcome, applied) = resolve_night(&mut state).unwrap();
        assert_eq!(outcome.deaths, vec![(HUNTER, DeathCause::Poison)]);
        assert_eq!(applied.len(), 1);
        let hunter = state.participant(HUNTER).unwrap();
        assert_eq!(hunter.death_cause, Some(DeathCause::Poison));
        assert!(!hunter.can_retaliate);
        assert!(state.participant(WITCH).unwrap().poison_used);
    }

    #[test]
    fn kill_and_separate_poison_both_die() {
        let state = fixed_state();
        let night = NightIntents {
            wolf_target: Some(PlayerId(8)),
            poison_target: Some(PlayerId(10)),
            ..intents()
        };
        let outcome = compute_night(&night, &state);
        assert_eq!(
            outcome.deaths,
            vec![
                (PlayerId(8), DeathCause::WolfKill),
                (PlayerId(10), DeathCause::Poison)
            ]
        );
    }

    #[test]
    fn abstained_kill_is_empty_and_peaceful() {
        let state = fixed_state();
        let outcome = compute_night(&intents(), &state);
        assert!(outcome.empty_kill);
        assert!(outcome.deaths.is_empty());
    }

    #[test]
    fn dead_target_is_not_killed_twice() {
        let mut state = fixed_state();
        state.kill(PlayerId(5), DeathCause::VoteExile).unwrap();
        state.night_mut().poison_target = Some(PlayerId(5));
        let (outcome, applied) = resolve_night(&mut state).unwrap();
        assert!(outcome.deaths.is_empty());
        assert!(applied.is_empty());
        assert_eq!(state.deaths().len(), 1);
    }

    #[test]
    fn inspection_reports_faction() {
        let state = fixed_state();
        let wolf = NightIntents {
            inspect_target: Some(PlayerId(10)),
            ..intents()
        };
        assert_eq!(
            compute_night(&wolf, &state).inspection,
            Some((PlayerId(10), InspectionResult::Wolf))
        );
        let villager = NightIntents {
            inspect_target: Some(PlayerId(5)),
            ..intents()
        };
        assert_eq!(
            compute_night(&villager, &state).inspection,
            Some((PlayerId(5), InspectionResult::NotWolf))
        );
    }

    #[test]
    fn inspection_result_is_stored_in_intents() {
        let mut state = fixed_state();
        state.night_mut().inspect_target = Some(PlayerId(12));
        resolve_night(&mut state).unwrap();
        assert_eq!(state.night().inspect_result, Some(InspectionResult::Wolf));
    }
}
