//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `werewolf-config.yaml` at the
//! project root. Every section and field is optional; missing values fall
//! back to the defaults below, so an empty file (or no file) is a valid
//! configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but makes no sense.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `werewolf-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WerewolfConfig {
    /// Round ceiling and random seed.
    #[serde(default)]
    pub game: GameConfig,

    /// Werewolf kill negotiation bounds.
    #[serde(default)]
    pub consensus: ConsensusConfig,

    /// Where decisions come from.
    #[serde(default)]
    pub decision: DecisionConfig,

    /// Snapshot persistence.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WerewolfConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `WEREWOLF_NATS_URL` overrides `decision.nats_url`
    /// - `WEREWOLF_DATA_DIR` overrides `persistence.data_dir`
    /// - `WEREWOLF_RESUME_GAME` overrides `persistence.resume_game_id`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any `key -> value` source.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("WEREWOLF_NATS_URL") {
            self.decision.nats_url = val;
        }
        if let Some(val) = lookup("WEREWOLF_DATA_DIR") {
            self.persistence.data_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("WEREWOLF_RESUME_GAME") {
            self.persistence.resume_game_id = Some(val);
        }
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.max_rounds == 0 {
            return Err(ConfigError::Invalid {
                field: "game.max_rounds",
                reason: String::from("must be at least 1"),
            });
        }
        if self.consensus.min_rounds == 0 {
            return Err(ConfigError::Invalid {
                field: "consensus.min_rounds",
                reason: String::from("must be at least 1"),
            });
        }
        if self.consensus.max_rounds < self.consensus.min_rounds {
            return Err(ConfigError::Invalid {
                field: "consensus.max_rounds",
                reason: format!(
                    "{} is below consensus.min_rounds ({})",
                    self.consensus.max_rounds, self.consensus.min_rounds
                ),
            });
        }
        Ok(())
    }
}

/// Game-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Last round that may be played; passing it is a draw.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Seed for the role deal, speech shuffles and fallback targets.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            seed: default_seed(),
        }
    }
}

/// Werewolf kill negotiation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ConsensusConfig {
    /// Rounds always played before consensus is checked.
    #[serde(default = "default_consensus_min_rounds")]
    pub min_rounds: u32,

    /// Rounds after which a decision is forced.
    #[serde(default = "default_consensus_max_rounds")]
    pub max_rounds: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            min_rounds: default_consensus_min_rounds(),
            max_rounds: default_consensus_max_rounds(),
        }
    }
}

/// Decision backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionBackend {
    /// Seeded random agents, no external process needed.
    #[default]
    Random,
    /// Request/reply over NATS to an external agent runner.
    Nats,
}

/// Decision port settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DecisionConfig {
    /// Which port implementation to use.
    #[serde(default)]
    pub backend: DecisionBackend,

    /// NATS server URL.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Prefix for every subject the engine publishes or subscribes to.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,

    /// How long the NATS port waits for one reply before giving up.
    #[serde(default = "default_decision_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            backend: DecisionBackend::default(),
            nats_url: default_nats_url(),
            subject_prefix: default_subject_prefix(),
            timeout_ms: default_decision_timeout_ms(),
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Whether snapshots are written at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Root directory; each game gets `game_<id>/` beneath it.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Resume this game instead of dealing a new one.
    #[serde(default)]
    pub resume_game_id: Option<String>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: default_data_dir(),
            resume_game_id: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_max_rounds() -> u32 {
    20
}

const fn default_seed() -> u64 {
    42
}

const fn default_consensus_min_rounds() -> u32 {
    2
}

const fn default_consensus_max_rounds() -> u32 {
    6
}

fn default_nats_url() -> String {
    String::from("nats://localhost:4222")
}

fn default_subject_prefix() -> String {
    String::from("werewolf")
}

const fn default_decision_timeout_ms() -> u64 {
    30_000
}

const fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("game_data")
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WerewolfConfig::default();
        assert_eq!(config.game.max_rounds, 20);
        assert_eq!(config.game.seed, 42);
        assert_eq!(config.consensus.min_rounds, 2);
        assert_eq!(config.consensus.max_rounds, 6);
        assert_eq!(config.decision.backend, DecisionBackend::Random);
        assert!(config.persistence.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
game:
  max_rounds: 12
  seed: 7

consensus:
  min_rounds: 1
  max_rounds: 4

decision:
  backend: nats
  subject_prefix: "table1"
  timeout_ms: 5000

persistence:
  enabled: false
  data_dir: "/tmp/wolves"

logging:
  level: "debug"
  json: true
"#;
        let config = WerewolfConfig::parse(yaml).unwrap();
        assert_eq!(config.game.max_rounds, 12);
        assert_eq!(config.game.seed, 7);
        assert_eq!(config.consensus.min_rounds, 1);
        assert_eq!(config.consensus.max_rounds, 4);
        assert_eq!(config.decision.backend, DecisionBackend::Nats);
        assert_eq!(config.decision.subject_prefix, "table1");
        assert_eq!(config.decision.timeout_ms, 5000);
        assert!(!config.persistence.enabled);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let config = WerewolfConfig::parse("game:\n  seed: 99\n").unwrap();
        assert_eq!(config.game.seed, 99);
        assert_eq!(config.game.max_rounds, 20);
        assert_eq!(config.consensus.max_rounds, 6);
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = WerewolfConfig::parse("").unwrap();
        assert_eq!(config.game, GameConfig::default());
    }

    #[test]
    fn rejects_inverted_consensus_bounds() {
        let result = WerewolfConfig::parse("consensus:\n  min_rounds: 5\n  max_rounds: 3\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "consensus.max_rounds",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_round_ceiling() {
        let result = WerewolfConfig::parse("game:\n  max_rounds: 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn overrides_replace_only_the_named_values() {
        let mut config = WerewolfConfig::default();
        config.apply_overrides(|key| match key {
            "WEREWOLF_DATA_DIR" => Some(String::from("/tmp/games")),
            "WEREWOLF_RESUME_GAME" => Some(String::from("abc")),
            _ => None,
        });
        assert_eq!(config.persistence.data_dir, PathBuf::from("/tmp/games"));
        assert_eq!(config.persistence.resume_game_id.as_deref(), Some("abc"));
        assert_eq!(config.decision.nats_url, "nats://localhost:4222");
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = WerewolfConfig::parse("game: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
