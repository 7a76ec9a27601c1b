//! The phase engine.
//!
//! [`GameEngine`] owns the [`GameState`] and drives it through the
//! night/day cycle one sub-phase at a time:
//!
//! ```text
//! NIGHT: Guard -> Wolf -> Witch -> Seer -> Resolve
//! DAY:   [LeaderElection] -> AnnounceDeaths -> LastWords -> Discussion -> Vote -> ExileWords
//! ```
//!
//! Before each sub-phase runs, the cursor is snapshotted (when a store is
//! attached), so a restarted process resumes at the last boundary. Every
//! decision call is a suspension point: the operator pause flag is checked
//! there and nowhere else, and exactly one call is outstanding at a time.
//!
//! Internal failures are caught at the top of [`GameEngine::run`], turned
//! into a terminal `game_error` event, and the game is marked failed.

mod day;
mod death;
mod election;
mod night;

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use werewolf_types::{
    DecisionKind, EventRecord, GameEvent, GameId, GameSnapshot, GameStatus, Phase, PlayerId,
    SubPhase, Winner,
};

use crate::config::WerewolfConfig;
use crate::consensus::ConsensusRules;
use crate::decision::{Decision, DecisionPort, DecisionRequest};
use crate::memory::{InMemoryMemory, MemoryPort};
use crate::operator::OperatorState;
use crate::phase::{first_day_step, next_sub_phase};
use crate::sink::{EventSink, TracingSink};
use crate::state::{GameState, StateError};
use crate::store::{SnapshotError, SnapshotStore};
use crate::victory::past_round_limit;

/// Errors that stop a game.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The entity store rejected a mutation.
    #[error("state error: {source}")]
    State {
        /// Underlying error.
        #[from]
        source: StateError,
    },

    /// A snapshot could not be written.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// Underlying error.
        #[from]
        source: SnapshotError,
    },

    /// A running game has no sub-phase to execute.
    #[error("game {game_id} is running without a sub-phase")]
    MissingCursor {
        /// The game.
        game_id: GameId,
    },
}

/// Tunables the engine reads while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Last round that may be played; the game is a draw after it.
    pub max_rounds: u32,
    /// Werewolf negotiation bounds.
    pub consensus: ConsensusRules,
    /// Seed for speaking-order shuffles and invalid-answer substitution.
    pub seed: u64,
}

impl EngineSettings {
    /// Settings from a loaded configuration.
    pub fn from_config(config: &WerewolfConfig) -> Self {
        Self {
            max_rounds: config.game.max_rounds,
            consensus: config.consensus.into(),
            seed: config.game.seed,
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&WerewolfConfig::default())
    }
}

/// How a game ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutcome {
    /// The game reached a result.
    Finished {
        /// Result.
        winner: Winner,
        /// Round in which the game ended.
        rounds: u32,
    },
    /// The game stopped on an internal error.
    Failed {
        /// Error description.
        message: String,
    },
}

/// What the run loop does after a sub-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Go to the next sub-phase.
    Continue,
    /// Skip the rest of the day.
    DayOver,
    /// Stop with a result.
    GameOver(Winner),
}

/// Drives one game from deal to result.
pub struct GameEngine<D> {
    state: GameState,
    settings: EngineSettings,
    decisions: D,
    memory: Box<dyn MemoryPort>,
    sink: Box<dyn EventSink>,
    store: Option<Box<dyn SnapshotStore>>,
    operator: Arc<OperatorState>,
    rng: StdRng,
    next_sequence: u64,
    terminated: bool,
}

impl<D> std::fmt::Debug for GameEngine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("game_id", &self.state.game_id())
            .field("round", &self.state.round())
            .field("sub_phase", &self.state.sub_phase())
            .field("next_sequence", &self.next_sequence)
            .finish_non_exhaustive()
    }
}

impl<D: DecisionPort> GameEngine<D> {
    /// An engine for a freshly dealt game, with in-process memory, a
    /// tracing event sink and no persistence.
    pub fn new(state: GameState, decisions: D, settings: EngineSettings) -> Self {
        Self {
            state,
            settings,
            decisions,
            memory: Box::new(InMemoryMemory::new()),
            sink: Box::new(TracingSink),
            store: None,
            operator: Arc::new(OperatorState::new()),
            rng: StdRng::seed_from_u64(settings.seed),
            next_sequence: 0,
            terminated: false,
        }
    }

    /// An engine that continues a snapshotted game at its recorded sub-phase.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::State`] if the snapshot is inconsistent.
    pub fn resume(
        snapshot: &GameSnapshot,
        decisions: D,
        settings: EngineSettings,
    ) -> Result<Self, EngineError> {
        let state = GameState::from_snapshot(snapshot)?;
        let mut engine = Self::new(state, decisions, settings);
        engine.next_sequence = snapshot.next_sequence;
        engine.rng = StdRng::seed_from_u64(settings.seed ^ snapshot.next_sequence);
        info!(
            game_id = %snapshot.game_id,
            round = snapshot.round,
            sub_phase = ?snapshot.sub_phase,
            next_sequence = snapshot.next_sequence,
            "Game restored from snapshot"
        );
        Ok(engine)
    }

    /// Replace the memory port.
    #[must_use]
    pub fn with_memory(mut self, memory: impl MemoryPort + 'static) -> Self {
        self.memory = Box::new(memory);
        self
    }

    /// Replace the event sink.
    #[must_use]
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Snapshot into `store` at every sub-phase boundary.
    #[must_use]
    pub fn with_store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Share pause control with the caller.
    #[must_use]
    pub fn with_operator(mut self, operator: Arc<OperatorState>) -> Self {
        self.operator = operator;
        self
    }

    /// The game as it stands.
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// The decision port, e.g. to inspect a scripted port after a run.
    pub const fn decisions(&self) -> &D {
        &self.decisions
    }

    /// Handle for pausing and resuming this game.
    pub fn operator(&self) -> Arc<OperatorState> {
        Arc::clone(&self.operator)
    }

    /// Play until the game has a result or fails.
    pub async fn run(&mut self) -> GameOutcome {
        match (self.state.status(), self.state.winner()) {
            (GameStatus::Finished, Some(winner)) => {
                return GameOutcome::Finished {
                    winner,
                    rounds: self.state.round(),
                };
            }
            (GameStatus::Failed, _) => {
                return GameOutcome::Failed {
                    message: format!("game {} already failed", self.state.game_id()),
                };
            }
            _ => {}
        }

        match self.drive().await {
            Ok(winner) => GameOutcome::Finished {
                winner,
                rounds: self.state.round(),
            },
            Err(e) => self.abort(&e),
        }
    }

    async fn drive(&mut self) -> Result<Winner, EngineError> {
        if self.state.status() == GameStatus::Created {
            self.start();
        }

        loop {
            let step = self.state.sub_phase().ok_or(EngineError::MissingCursor {
                game_id: self.state.game_id(),
            })?;

            self.checkpoint()?;
            self.emit(GameEvent::PhaseChanged {
                phase: step.phase(),
                sub_phase: Some(step),
            });
            debug!(round = self.state.round(), sub_phase = ?step, "Sub-phase started");

            let flow = match step {
                SubPhase::Guard => self.guard_step().await?,
                SubPhase::Wolf => self.wolf_step().await?,
                SubPhase::Witch => self.witch_step().await?,
                SubPhase::Seer => self.seer_step().await?,
                SubPhase::Resolve => self.resolve_step()?,
                SubPhase::LeaderElection => self.election_step().await?,
                SubPhase::AnnounceDeaths => self.announce_step(),
                SubPhase::LastWords => self.last_words_step().await?,
                SubPhase::Discussion => self.discussion_step().await?,
                SubPhase::Vote => self.vote_step().await?,
                SubPhase::ExileWords => self.exile_words_step().await?,
            };

            let round = self.state.round();
            let ended = match flow {
                Flow::GameOver(winner) => Some(winner),
                Flow::DayOver => self.next_round(),
                Flow::Continue => match next_sub_phase(step, round) {
                    Some(next) => {
                        self.state.set_cursor(next.phase(), Some(next));
                        None
                    }
                    None if step.phase() == Phase::Night => {
                        self.state
                            .set_cursor(Phase::Day, Some(first_day_step(round)));
                        None
                    }
                    None => self.next_round(),
                },
            };
            if let Some(winner) = ended {
                self.finish(winner);
                return Ok(winner);
            }
        }
    }

    fn start(&mut self) {
        self.state.mark_running();
        self.state.set_cursor(Phase::Night, Some(SubPhase::Guard));
        info!(
            game_id = %self.state.game_id(),
            max_rounds = self.settings.max_rounds,
            "Game started"
        );
        self.emit(GameEvent::PhaseChanged {
            phase: Phase::Start,
            sub_phase: None,
        });

        let round = self.state.round();
        let wolves = self.state.alive_wolves();
        let briefings: Vec<(PlayerId, String)> = self
            .state
            .participants()
            .iter()
            .map(|p| {
                let mut text = format!("You are Player {}. Your role is {}.", p.id, p.role);
                if p.role.has_night_action() {
                    text.push_str(" You act during the night.");
                }
                if p.is_wolf() {
                    let pack = seat_list(wolves.iter().filter(|w| **w != p.id));
                    text.push_str(&format!(" Your fellow werewolves are {pack}."));
                }
                (p.id, text)
            })
            .collect();
        for (player, text) in briefings {
            self.memory.record_private(player, round, &text);
        }
    }

    /// Move to the next round's night, or return the draw if the ceiling passed.
    fn next_round(&mut self) -> Option<Winner> {
        let round = self.state.advance_round();
        if past_round_limit(round, self.settings.max_rounds) {
            info!(round, max_rounds = self.settings.max_rounds, "Round ceiling reached");
            return Some(Winner::Draw);
        }
        self.state.set_speech_order(None);
        self.state.set_cursor(Phase::Night, Some(SubPhase::Guard));
        None
    }

    fn finish(&mut self, winner: Winner) {
        self.state.finish(winner);
        let rounds = self.state.round();
        info!(game_id = %self.state.game_id(), ?winner, rounds, "Game ended");
        self.emit(GameEvent::GameEnded { winner, rounds });
        if let Err(e) = self.checkpoint() {
            warn!(error = %e, "Failed to save final snapshot");
        }
    }

    fn abort(&mut self, err: &EngineError) -> GameOutcome {
        let message = err.to_string();
        error!(
            game_id = %self.state.game_id(),
            round = self.state.round(),
            sub_phase = ?self.state.sub_phase(),
            error = %message,
            "Game aborted"
        );
        self.state.fail();
        self.emit(GameEvent::GameError {
            message: message.clone(),
        });
        if let Err(e) = self.checkpoint() {
            warn!(error = %e, "Failed to save snapshot of failed game");
        }
        GameOutcome::Failed { message }
    }

    // -----------------------------------------------------------------------
    // Plumbing shared by the sub-phases
    // -----------------------------------------------------------------------

    fn checkpoint(&mut self) -> Result<(), EngineError> {
        if let Some(store) = self.store.as_mut() {
            store.save(&self.state.to_snapshot(self.next_sequence))?;
        }
        Ok(())
    }

    fn emit(&mut self, event: GameEvent) {
        if self.terminated {
            warn!(?event, "Event after game end dropped");
            return;
        }
        self.terminated = event.is_terminal();
        let record = EventRecord {
            game_id: self.state.game_id(),
            sequence: self.next_sequence,
            round: self.state.round(),
            event,
        };
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.sink.emit(&record);
    }

    /// Ask one participant one question.
    ///
    /// A port failure is logged and answered with an empty decision, which
    /// every caller maps to its neutral default.
    async fn ask(
        &mut self,
        player: PlayerId,
        kind: DecisionKind,
        options: Vec<PlayerId>,
        context: Value,
    ) -> Result<Decision, EngineError> {
        self.operator.wait_if_paused().await;

        let role = self
            .state
            .role_of(player)
            .ok_or(StateError::UnknownPlayer { player })?;
        self.emit(GameEvent::DecisionRequested { player, kind });

        let request = DecisionRequest {
            game_id: self.state.game_id(),
            round: self.state.round(),
            player,
            role,
            kind,
            options,
            context,
            memory: self.memory.summary(player),
        };
        match self.decisions.decide(&request).await {
            Ok(decision) => Ok(decision),
            Err(e) => {
                warn!(player = %player, kind = %kind, error = %e, "Decision unavailable, using default");
                Ok(Decision::new())
            }
        }
    }

    /// Read a forced-choice target: explicit `null` abstains, anything
    /// missing or invalid becomes a uniformly random option.
    fn forced_choice(
        &mut self,
        decision: &Decision,
        key: &str,
        options: &[PlayerId],
    ) -> Option<PlayerId> {
        if decision.abstains(key) {
            return None;
        }
        decision.target(key, options).or_else(|| {
            let substitute = options.choose(&mut self.rng).copied();
            if let Some(seat) = substitute {
                debug!(key, substitute = %seat, "Forced choice substituted");
            }
            substitute
        })
    }

    /// Record a fact for every living participant.
    fn announce(&mut self, text: &str) {
        let living = self.state.alive_ids();
        self.memory
            .record_public(&living, self.state.round(), text);
    }

    /// Record a speech for every living participant and the speaker.
    fn broadcast(&mut self, speaker: PlayerId, text: &str) {
        let mut audience = self.state.alive_ids();
        if !audience.contains(&speaker) {
            audience.push(speaker);
        }
        self.memory
            .broadcast(speaker, self.state.round(), text, &audience, &[]);
    }
}

/// "Players 3, 7 and 9" style list.
fn seat_list<'a>(seats: impl IntoIterator<Item = &'a PlayerId>) -> String {
    let seats: Vec<String> = seats.into_iter().map(ToString::to_string).collect();
    match seats.as_slice() {
        [] => String::from("nobody"),
        [one] => format!("Player {one}"),
        [init @ .., last] => format!("Players {} and {last}", init.join(", ")),
    }
}
