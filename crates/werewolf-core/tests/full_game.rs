//! Whole games played through the public API.
//!
//! Seeded random games exercise the engine across many shapes of play and
//! check the invariants that must hold at the end of any game. Two
//! scripted games pin down each faction's win condition exactly.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc,
    clippy::panic,
    clippy::arithmetic_side_effects
)]

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use werewolf_core::decision::{Decision, RandomDecisionPort, ScriptedDecisionPort, fields};
use werewolf_core::engine::{EngineSettings, GameEngine, GameOutcome};
use werewolf_core::sink::RecordingSink;
use werewolf_core::state::GameState;
use werewolf_core::store::{JsonFileStore, SnapshotStore};
use werewolf_types::{
    DeathCause, DecisionKind, EventRecord, GameEvent, GameId, GameStatus, PlayerId, Role, SpeechKind,
    Winner,
};

// =============================================================================
// Helpers
// =============================================================================

async fn random_game(seed: u64) -> (GameEngine<RandomDecisionPort>, GameOutcome, Vec<EventRecord>) {
    let mut dealer = StdRng::seed_from_u64(seed);
    let state = GameState::deal(GameId::new(), &mut dealer);
    let settings = EngineSettings {
        seed,
        ..EngineSettings::default()
    };
    let sink = RecordingSink::new();
    let mut engine = GameEngine::new(state, RandomDecisionPort::seeded(seed), settings)
        .with_sink(sink.clone());
    let outcome = engine.run().await;
    (engine, outcome, sink.records())
}

fn assert_game_invariants(state: &GameState, outcome: &GameOutcome, records: &[EventRecord]) {
    let GameOutcome::Finished { winner, rounds } = outcome else {
        panic!("game failed: {outcome:?}");
    };
    assert_eq!(state.status(), GameStatus::Finished);
    assert_eq!(state.winner(), Some(*winner));

    // Stream shape: contiguous sequence, one terminal event, last.
    for (expected, record) in (0_u64..).zip(records) {
        assert_eq!(record.sequence, expected);
    }
    assert_eq!(records.iter().filter(|r| r.event.is_terminal()).count(), 1);
    assert_eq!(
        records.last().map(|r| &r.event),
        Some(&GameEvent::GameEnded {
            winner: *winner,
            rounds: *rounds
        })
    );

    // Nobody dies twice, and every death was announced as an event.
    let dead: BTreeSet<PlayerId> = state.deaths().iter().map(|d| d.player).collect();
    assert_eq!(dead.len(), state.deaths().len());
    let death_events = records
        .iter()
        .filter(|r| matches!(r.event, GameEvent::Death { .. }))
        .count();
    assert_eq!(death_events, state.deaths().len());

    // The badge is never held by the dead.
    if let Some(holder) = state.leader() {
        assert!(state.is_alive(holder));
    }

    // Each potion at most once.
    let heals = records
        .iter()
        .filter(|r| matches!(r.event, GameEvent::Healed { .. }))
        .count();
    assert!(heals <= 1);
    let poisons = state
        .deaths()
        .iter()
        .filter(|d| d.cause == DeathCause::Poison)
        .count();
    assert!(poisons <= 1);

    // The Guard never protects the same participant two nights running.
    let protected: Vec<Option<PlayerId>> = records
        .iter()
        .filter_map(|r| match r.event {
            GameEvent::GuardProtected { target, .. } => Some(target),
            _ => None,
        })
        .collect();
    for pair in protected.windows(2) {
        if let [Some(a), Some(b)] = pair {
            assert_ne!(a, b);
        }
    }

    // The declared result agrees with who is left.
    let wolves_left = !state.alive_wolves().is_empty();
    let villagers_left = !state.alive_with_role(Role::Villager).is_empty();
    let specials_left = state
        .alive_good()
        .iter()
        .any(|p| state.role_of(*p) != Some(Role::Villager));
    match winner {
        Winner::Good => assert!(!wolves_left),
        Winner::Wolf => assert!(!villagers_left || !specials_left),
        Winner::Draw => {
            assert!(wolves_left && villagers_left && specials_left);
            assert_eq!(*rounds, EngineSettings::default().max_rounds + 1);
        }
    }
}

fn vote_abstain(_: &werewolf_core::decision::DecisionRequest) -> Decision {
    Decision::from_value(json!({ "vote_target": null }))
}

// =============================================================================
// Random games
// =============================================================================

#[tokio::test]
async fn seeded_random_games_finish_consistently() {
    for seed in 0..12 {
        let (engine, outcome, records) = random_game(seed).await;
        assert_game_invariants(engine.state(), &outcome, &records);
    }
}

#[tokio::test]
async fn same_seed_same_game() {
    let (first, first_outcome, first_records) = random_game(7).await;
    let (second, second_outcome, second_records) = random_game(7).await;

    assert_eq!(first_outcome, second_outcome);
    let strip = |records: &[EventRecord]| -> Vec<GameEvent> {
        records.iter().map(|r| r.event.clone()).collect()
    };
    assert_eq!(strip(&first_records), strip(&second_records));
    let roles = |engine: &GameEngine<RandomDecisionPort>| -> Vec<Role> {
        engine.state().participants().iter().map(|p| p.role).collect()
    };
    assert_eq!(roles(&first), roles(&second));
}

#[tokio::test]
async fn snapshots_land_on_disk() {
    let root = std::env::temp_dir().join(format!("werewolf-it-{}", uuid::Uuid::new_v4()));
    let store = JsonFileStore::new(&root);
    let state = GameState::deal(GameId::new(), &mut StdRng::seed_from_u64(3));
    let game_id = state.game_id();

    let mut engine = GameEngine::new(state, RandomDecisionPort::seeded(3), EngineSettings::default())
        .with_store(store.clone());
    let outcome = engine.run().await;

    let saved = store.load(game_id).unwrap().expect("final snapshot present");
    assert_eq!(saved.status, GameStatus::Finished);
    assert!(matches!(outcome, GameOutcome::Finished { winner, .. } if saved.winner == Some(winner)));
    assert_eq!(store.list_games().unwrap(), vec![game_id]);

    std::fs::remove_dir_all(&root).ok();
}

// =============================================================================
// Scripted games
// =============================================================================

/// Seats 1-4 Seer/Witch/Hunter/Guard, 5-8 Villagers, 9-12 Werewolves.
fn fixed_game() -> GameState {
    GameState::with_roles(GameId::new(), &Role::STANDARD_DEAL).unwrap()
}

#[tokio::test]
async fn wolves_win_once_every_special_role_is_gone() {
    // The pack always hunts the lowest seat; the town never exiles anyone.
    let port = ScriptedDecisionPort::new()
        .respond(DecisionKind::WolfProposal, |req| match req.options.first() {
            Some(seat) => Decision::new().with(fields::TARGET, seat.seat()),
            None => Decision::new(),
        })
        .respond(DecisionKind::ExileVote, vote_abstain);
    let sink = RecordingSink::new();
    let mut engine =
        GameEngine::new(fixed_game(), port, EngineSettings::default()).with_sink(sink.clone());

    let outcome = engine.run().await;

    assert_eq!(
        outcome,
        GameOutcome::Finished {
            winner: Winner::Wolf,
            rounds: 4
        }
    );
    let victims: Vec<PlayerId> = engine.state().deaths().iter().map(|d| d.player).collect();
    assert_eq!(
        victims,
        vec![PlayerId(1), PlayerId(2), PlayerId(3), PlayerId(4)]
    );
    // The Hunter was offered the shot and held fire.
    assert!(sink.records().iter().any(|r| r.event
        == GameEvent::RetaliationShot {
            shooter: PlayerId(3),
            target: None
        }));
    assert_game_invariants(engine.state(), &outcome, &sink.records());
}

/// The Guard reads the pack every night and the town votes out the
/// lowest living wolf every day.
fn guarded_town_port() -> ScriptedDecisionPort {
    ScriptedDecisionPort::new()
        .respond(DecisionKind::GuardProtect, |req| {
            // Alternate between Seer and Witch so the guard never repeats.
            let pick = if req.round % 2 == 1 { 1_u8 } else { 2 };
            Decision::new().with(fields::TARGET, pick)
        })
        .respond(DecisionKind::WolfProposal, |req| {
            // The pack keeps attacking the guarded seat.
            let pick = if req.round % 2 == 1 { 1_u8 } else { 2 };
            Decision::new().with(fields::TARGET, pick)
        })
        .respond(DecisionKind::ExileVote, |req| {
            let wolf = req.options.iter().find(|p| p.seat() >= 9);
            match wolf {
                Some(seat) => Decision::new().with(fields::VOTE_TARGET, seat.seat()),
                None => Decision::from_value(json!({ "vote_target": null })),
            }
        })
}

#[tokio::test]
async fn town_wins_when_the_seer_leads_the_vote() {
    let port = guarded_town_port();
    let sink = RecordingSink::new();
    let mut engine =
        GameEngine::new(fixed_game(), port, EngineSettings::default()).with_sink(sink.clone());

    let outcome = engine.run().await;

    assert_eq!(
        outcome,
        GameOutcome::Finished {
            winner: Winner::Good,
            rounds: 4
        }
    );
    let exiled: Vec<PlayerId> = engine
        .state()
        .deaths()
        .iter()
        .filter(|d| d.cause == DeathCause::VoteExile)
        .map(|d| d.player)
        .collect();
    assert_eq!(
        exiled,
        vec![PlayerId(9), PlayerId(10), PlayerId(11), PlayerId(12)]
    );
    let blocked = sink
        .records()
        .iter()
        .filter(|r| matches!(r.event, GameEvent::KillBlocked { .. }))
        .count();
    assert_eq!(blocked, 4);
    assert_game_invariants(engine.state(), &outcome, &sink.records());
}

#[tokio::test]
async fn deciding_exile_still_grants_last_words() {
    let sink = RecordingSink::new();
    let mut engine = GameEngine::new(fixed_game(), guarded_town_port(), EngineSettings::default())
        .with_sink(sink.clone());

    let outcome = engine.run().await;
    assert!(matches!(
        outcome,
        GameOutcome::Finished {
            winner: Winner::Good,
            ..
        }
    ));

    // Seat 12 is the last wolf; its exile ends the game.
    let records = sink.records();
    let words = records
        .iter()
        .position(|r| {
            matches!(
                r.event,
                GameEvent::Speech {
                    player: PlayerId(12),
                    kind: SpeechKind::LastWords,
                    ..
                }
            )
        })
        .expect("last wolf spoke");
    let end = records
        .iter()
        .position(|r| matches!(r.event, GameEvent::GameEnded { .. }))
        .expect("game ended");
    assert!(words < end);
    assert_game_invariants(engine.state(), &outcome, &records);
}
