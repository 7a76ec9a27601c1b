//! Game engine binary for the werewolf orchestrator.
//!
//! This is the entry point that wires together the phase engine, a decision
//! port, snapshot persistence, event fan-out and operator controls. It
//! loads configuration, deals a new game (or restores one from disk), and
//! plays it to a result.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `werewolf-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Open the snapshot store and deal or restore the game
//! 4. Create operator state
//! 5. Connect to NATS (NATS backend only)
//! 6. Wire event sinks: tracing, plus NATS fan-out when connected
//! 7. Subscribe to operator control commands
//! 8. Run the game
//! 9. Log the result

mod control;
mod error;
mod nats_decision;
mod publisher;
mod subjects;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use werewolf_core::config::{DecisionBackend, LoggingConfig, WerewolfConfig};
use werewolf_core::decision::{DecisionPort, RandomDecisionPort};
use werewolf_core::engine::{EngineSettings, GameEngine, GameOutcome};
use werewolf_core::operator::OperatorState;
use werewolf_core::sink::{ChannelSink, FanoutSink, TracingSink};
use werewolf_core::state::GameState;
use werewolf_core::store::{JsonFileStore, SnapshotStore};
use werewolf_types::{GameId, GameSnapshot};

use crate::error::AppError;
use crate::nats_decision::NatsDecisionPort;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "werewolf-config.yaml";

/// How the game is opened.
enum Opening {
    /// A freshly dealt table.
    Fresh(GameState),
    /// A game restored from its last snapshot.
    Restored(Box<GameSnapshot>),
}

/// Everything the engine needs except the decision port.
struct Table {
    opening: Opening,
    settings: EngineSettings,
    store: Option<JsonFileStore>,
    sink: FanoutSink,
    operator: Arc<OperatorState>,
}

impl Table {
    /// Seat the agents behind `decisions` at this table.
    fn seat<D: DecisionPort>(self, decisions: D) -> Result<GameEngine<D>, AppError> {
        let engine = match self.opening {
            Opening::Fresh(state) => GameEngine::new(state, decisions, self.settings),
            Opening::Restored(snapshot) => {
                GameEngine::resume(&snapshot, decisions, self.settings)?
            }
        };
        let engine = engine.with_sink(self.sink).with_operator(self.operator);
        Ok(match self.store {
            Some(store) => engine.with_store(store),
            None => engine,
        })
    }
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails or the game ends on an
/// internal error.
#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("werewolf-engine starting");
    info!(
        from_file,
        backend = ?config.decision.backend,
        max_rounds = config.game.max_rounds,
        seed = config.game.seed,
        consensus_min = config.consensus.min_rounds,
        consensus_max = config.consensus.max_rounds,
        "Configuration loaded"
    );

    // 3. Open the snapshot store and deal or restore the game.
    let data_dir = &config.persistence.data_dir;
    let opening = open_game(&config)?;
    let game_id = match &opening {
        Opening::Fresh(state) => state.game_id(),
        Opening::Restored(snapshot) => snapshot.game_id,
    };
    let store = config
        .persistence
        .enabled
        .then(|| JsonFileStore::new(data_dir));
    info!(
        game_id = %game_id,
        persistence = store.is_some(),
        data_dir = %data_dir.display(),
        "Game ready"
    );

    // 4. Create operator state.
    let operator = Arc::new(OperatorState::new());

    // 5. Connect to NATS.
    let prefix = config.decision.subject_prefix.clone();
    let timeout = Duration::from_millis(config.decision.timeout_ms);
    let nats = match config.decision.backend {
        DecisionBackend::Random => None,
        DecisionBackend::Nats => {
            let url = &config.decision.nats_url;
            info!(nats_url = url, timeout_ms = config.decision.timeout_ms, "Connecting to NATS");
            let client = async_nats::ConnectOptions::new()
                .request_timeout(Some(timeout))
                .connect(url.as_str())
                .await
                .map_err(|e| AppError::Nats {
                    message: format!("failed to connect to {url}: {e}"),
                })?;
            info!("NATS connection established");
            Some(client)
        }
    };

    // 6. Wire event sinks.
    let mut sink = FanoutSink::new().with(TracingSink);
    let forwarder = match &nats {
        Some(client) => {
            let (channel, rx) = ChannelSink::new();
            sink = sink.with(channel);
            let subject = subjects::events(&prefix, game_id);
            info!(subject = subject, "Publishing game events");
            Some(publisher::spawn_event_forwarder(client.clone(), subject, rx))
        }
        None => None,
    };

    // 7. Subscribe to operator control commands.
    let listener = match &nats {
        Some(client) => Some(
            control::spawn_control_listener(
                client,
                subjects::control(&prefix, game_id),
                Arc::clone(&operator),
            )
            .await?,
        ),
        None => None,
    };

    // 8. Run the game.
    let settings = EngineSettings::from_config(&config);
    let table = Table {
        opening,
        settings,
        store,
        sink,
        operator,
    };
    let outcome = match nats {
        None => {
            let mut engine = table.seat(RandomDecisionPort::seeded(settings.seed))?;
            engine.run().await
        }
        Some(client) => {
            let mut engine = table.seat(NatsDecisionPort::new(client, prefix, timeout))?;
            engine.run().await
        }
    };

    // 9. Log the result. The engine (and its channel sender) is gone, so
    //    the forwarder drains and stops.
    if let Some(handle) = listener {
        handle.abort();
    }
    if let Some(handle) = forwarder {
        match handle.await {
            Ok(published) => info!(published, "Event stream closed"),
            Err(e) => error!(error = %e, "Event forwarder task failed"),
        }
    }

    match outcome {
        GameOutcome::Finished { winner, rounds } => {
            info!(game_id = %game_id, ?winner, rounds, "werewolf-engine shutdown complete");
            Ok(())
        }
        GameOutcome::Failed { message } => {
            error!(game_id = %game_id, error = %message, "Game failed");
            anyhow::bail!("game {game_id} failed: {message}")
        }
    }
}

/// Load configuration from `werewolf-config.yaml`, or defaults if absent.
///
/// Returns whether a file was found, for logging once tracing is up.
fn load_config() -> Result<(WerewolfConfig, bool), AppError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok((WerewolfConfig::from_file(path)?, true))
    } else {
        Ok((WerewolfConfig::parse("")?, false))
    }
}

/// Install the global subscriber: `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Restore the configured game from disk, or deal a new one.
fn open_game(config: &WerewolfConfig) -> Result<Opening, AppError> {
    let Some(raw) = config.persistence.resume_game_id.as_deref() else {
        let mut dealer = StdRng::seed_from_u64(config.game.seed);
        return Ok(Opening::Fresh(GameState::deal(GameId::new(), &mut dealer)));
    };

    let game_id = uuid::Uuid::parse_str(raw.trim())
        .map(GameId::from)
        .map_err(|e| AppError::InvalidGameId {
            value: raw.to_owned(),
            reason: e.to_string(),
        })?;
    let store = JsonFileStore::new(&config.persistence.data_dir);
    let snapshot = store
        .load(game_id)?
        .ok_or(AppError::GameNotFound { game_id })?;
    info!(
        game_id = %game_id,
        round = snapshot.round,
        sub_phase = ?snapshot.sub_phase,
        status = ?snapshot.status,
        "Restoring game from snapshot"
    );
    Ok(Opening::Restored(Box::new(snapshot)))
}
