//! Snapshot persistence.
//!
//! The engine saves a [`GameSnapshot`] before every sub-phase and after the
//! game ends. [`JsonFileStore`] keeps the latest snapshot per game at
//! `<root>/game_<id>/engine_state.json`; each write goes to a temporary
//! file that is then renamed over the old one, so a crash mid-write leaves
//! the previous snapshot intact.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;
use werewolf_types::{GameId, GameSnapshot};

const SNAPSHOT_FILE: &str = "engine_state.json";
const GAME_DIR_PREFIX: &str = "game_";

/// Errors from snapshot persistence.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Filesystem failure.
    #[error("snapshot I/O error: {source}")]
    Io {
        /// Underlying error.
        #[from]
        source: std::io::Error,
    },

    /// Snapshot could not be encoded or decoded.
    #[error("snapshot JSON error: {source}")]
    Json {
        /// Underlying error.
        #[from]
        source: serde_json::Error,
    },

    /// A shared in-memory store was poisoned by a panicking writer.
    #[error("snapshot store lock poisoned: {message}")]
    Poisoned {
        /// Lock error description.
        message: String,
    },
}

/// Where snapshots are kept.
pub trait SnapshotStore: Send {
    /// Replace the stored snapshot for the snapshot's game.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the snapshot could not be written.
    fn save(&mut self, snapshot: &GameSnapshot) -> Result<(), SnapshotError>;

    /// Latest snapshot of `game_id`, if one was saved.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if a stored snapshot exists but cannot be read.
    fn load(&self, game_id: GameId) -> Result<Option<GameSnapshot>, SnapshotError>;
}

// ---------------------------------------------------------------------------
// JSON files
// ---------------------------------------------------------------------------

/// One JSON file per game under a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// A store rooted at `root`. Directories are created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Snapshot path for `game_id`.
    pub fn snapshot_path(&self, game_id: GameId) -> PathBuf {
        self.root
            .join(format!("{GAME_DIR_PREFIX}{game_id}"))
            .join(SNAPSHOT_FILE)
    }

    /// Games with a snapshot on disk, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Io`] if the data directory cannot be listed.
    pub fn list_games(&self) -> Result<Vec<GameId>, SnapshotError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut games = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(id) = name
                .to_str()
                .and_then(|n| n.strip_prefix(GAME_DIR_PREFIX))
                .and_then(|n| Uuid::parse_str(n).ok())
            else {
                continue;
            };
            if entry.path().join(SNAPSHOT_FILE).is_file() {
                games.push(GameId::from(id));
            }
        }
        games.sort_unstable();
        Ok(games)
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&mut self, snapshot: &GameSnapshot) -> Result<(), SnapshotError> {
        let path = self.snapshot_path(snapshot.game_id);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(snapshot)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        debug!(
            game_id = %snapshot.game_id,
            round = snapshot.round,
            sub_phase = ?snapshot.sub_phase,
            "Snapshot saved"
        );
        Ok(())
    }

    fn load(&self, game_id: GameId) -> Result<Option<GameSnapshot>, SnapshotError> {
        let path = self.snapshot_path(game_id);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Keeps every saved snapshot; clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    history: Arc<Mutex<Vec<GameSnapshot>>>,
}

impl MemorySnapshotStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every snapshot saved so far, oldest first.
    pub fn history(&self) -> Vec<GameSnapshot> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&mut self, snapshot: &GameSnapshot) -> Result<(), SnapshotError> {
        self.history
            .lock()
            .map_err(|e| SnapshotError::Poisoned {
                message: e.to_string(),
            })?
            .push(snapshot.clone());
        Ok(())
    }

    fn load(&self, game_id: GameId) -> Result<Option<GameSnapshot>, SnapshotError> {
        let history = self.history.lock().map_err(|e| SnapshotError::Poisoned {
            message: e.to_string(),
        })?;
        Ok(history.iter().rev().find(|s| s.game_id == game_id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use werewolf_types::{Phase, SubPhase};

    use super::*;
    use crate::state::tests::fixed_state;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("werewolf-store-{}", Uuid::new_v4()))
    }

    #[test]
    fn file_store_roundtrips_latest_snapshot() {
        let root = scratch_dir();
        let mut store = JsonFileStore::new(&root);
        let mut state = fixed_state();

        store.save(&state.to_snapshot(0)).unwrap();
        state.set_cursor(Phase::Night, Some(SubPhase::Witch));
        store.save(&state.to_snapshot(9)).unwrap();

        let loaded = store.load(state.game_id()).unwrap().unwrap();
        assert_eq!(loaded.sub_phase, Some(SubPhase::Witch));
        assert_eq!(loaded.next_sequence, 9);
        assert!(!store.snapshot_path(state.game_id()).with_extension("json.tmp").exists());
        assert_eq!(store.list_games().unwrap(), vec![state.game_id()]);

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn missing_game_loads_as_none() {
        let store = JsonFileStore::new(scratch_dir());
        assert!(store.load(GameId::new()).unwrap().is_none());
        assert!(store.list_games().unwrap().is_empty());
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let root = scratch_dir();
        let store = JsonFileStore::new(&root);
        let id = GameId::new();
        let path = store.snapshot_path(id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(store.load(id), Err(SnapshotError::Json { .. })));
        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn memory_store_returns_most_recent() {
        let mut store = MemorySnapshotStore::new();
        let state = fixed_state();
        store.save(&state.to_snapshot(1)).unwrap();
        store.save(&state.to_snapshot(2)).unwrap();
        assert_eq!(store.load(state.game_id()).unwrap().unwrap().next_sequence, 2);
        assert_eq!(store.history().len(), 2);
    }
}
