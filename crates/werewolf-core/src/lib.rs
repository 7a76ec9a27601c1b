//! Phase engine and rules for a twelve-seat werewolf game.
//!
//! This crate owns everything between the deal and the result: the
//! night/day sub-phase cycle, night resolution, the weighted exile vote,
//! the leadership badge, werewolf kill negotiation and the victory check.
//! Agents are reached only through the [`DecisionPort`] seam, so the same
//! engine runs against a message bus, a random player or a script.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `werewolf-config.yaml` into
//!   strongly-typed structs.
//! - [`consensus`] -- Multi-round werewolf kill negotiation.
//! - [`decision`] -- [`DecisionPort`] trait, [`Decision`] parsing,
//!   [`RandomDecisionPort`] and [`ScriptedDecisionPort`].
//! - [`engine`] -- [`GameEngine`], the sub-phase loop.
//! - [`last_words`] -- Which deaths grant a final statement.
//! - [`leadership`] -- Election, badge weight and succession.
//! - [`memory`] -- Per-participant notebooks behind [`MemoryPort`].
//! - [`operator`] -- Pause and resume between decision calls.
//! - [`phase`] -- Sub-phase ordering and the daily speaking order.
//! - [`resolver`] -- Night resolution in fixed order.
//! - [`sink`] -- Event delivery behind [`EventSink`].
//! - [`state`] -- [`GameState`], the single entity store.
//! - [`store`] -- Snapshot persistence behind [`SnapshotStore`].
//! - [`victory`] -- Win conditions and the round ceiling.
//! - [`voting`] -- Ballots and tallies.
//!
//! [`DecisionPort`]: decision::DecisionPort
//! [`Decision`]: decision::Decision
//! [`RandomDecisionPort`]: decision::RandomDecisionPort
//! [`ScriptedDecisionPort`]: decision::ScriptedDecisionPort
//! [`GameEngine`]: engine::GameEngine
//! [`MemoryPort`]: memory::MemoryPort
//! [`EventSink`]: sink::EventSink
//! [`GameState`]: state::GameState
//! [`SnapshotStore`]: store::SnapshotStore

pub mod config;
pub mod consensus;
pub mod decision;
pub mod engine;
pub mod last_words;
pub mod leadership;
pub mod memory;
pub mod operator;
pub mod phase;
pub mod resolver;
pub mod sink;
pub mod state;
pub mod store;
pub mod victory;
pub mod voting;
