//! Participant memory.
//!
//! Each participant has a private notebook of what they witnessed or
//! learned. The engine writes to it at fixed points (deaths announced,
//! speeches heard, inspection results, potion use, kill negotiations) and
//! reads a text summary of it into every [`DecisionRequest`].
//!
//! Privacy: a fact written with [`MemoryPort::record_private`] is visible
//! only to its owner's summary. Public facts reach every listed audience
//! member.
//!
//! [`DecisionRequest`]: crate::decision::DecisionRequest

use std::collections::BTreeMap;
use std::fmt::Write as _;

use werewolf_types::PlayerId;

/// Entries kept per participant in a summary.
const SUMMARY_WINDOW: usize = 40;

/// Where participants' memories live.
pub trait MemoryPort: Send {
    /// Record a fact every member of `audience` witnessed.
    fn record_public(&mut self, audience: &[PlayerId], round: u32, text: &str);

    /// Record a fact only `player` knows.
    fn record_private(&mut self, player: PlayerId, round: u32, text: &str);

    /// Record `speaker`'s speech for every living listener.
    ///
    /// The speaker's own copy is kept too; `exclude` lists seats that did
    /// not hear it.
    fn broadcast(
        &mut self,
        speaker: PlayerId,
        round: u32,
        text: &str,
        living: &[PlayerId],
        exclude: &[PlayerId],
    ) {
        let audience: Vec<PlayerId> = living
            .iter()
            .copied()
            .filter(|p| !exclude.contains(p))
            .collect();
        let line = format!("Player {speaker} said: {text}");
        self.record_public(&audience, round, &line);
    }

    /// Text summary of what `player` remembers, oldest first.
    fn summary(&self, player: PlayerId) -> String;
}

/// Visibility of a remembered fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Witnessed by several participants.
    Public,
    /// Known only to the owner.
    Private,
}

/// One remembered fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    /// Round the fact was recorded in.
    pub round: u32,
    /// Who else may know it.
    pub visibility: Visibility,
    /// The fact.
    pub text: String,
}

/// Process-local memory, one notebook per seat.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMemory {
    notebooks: BTreeMap<PlayerId, Vec<MemoryEntry>>,
}

impl InMemoryMemory {
    /// Empty notebooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything `player` remembers, oldest first.
    pub fn entries(&self, player: PlayerId) -> &[MemoryEntry] {
        self.notebooks.get(&player).map_or(&[], Vec::as_slice)
    }

    fn push(&mut self, player: PlayerId, round: u32, visibility: Visibility, text: &str) {
        self.notebooks.entry(player).or_default().push(MemoryEntry {
            round,
            visibility,
            text: text.to_owned(),
        });
    }
}

impl MemoryPort for InMemoryMemory {
    fn record_public(&mut self, audience: &[PlayerId], round: u32, text: &str) {
        for &player in audience {
            self.push(player, round, Visibility::Public, text);
        }
    }

    fn record_private(&mut self, player: PlayerId, round: u32, text: &str) {
        self.push(player, round, Visibility::Private, text);
    }

    fn summary(&self, player: PlayerId) -> String {
        let entries = self.entries(player);
        let skip = entries.len().saturating_sub(SUMMARY_WINDOW);
        let mut out = String::new();
        for entry in entries.iter().skip(skip) {
            let marker = match entry.visibility {
                Visibility::Public => "",
                Visibility::Private => " (private)",
            };
            let _ = writeln!(out, "[round {}]{marker} {}", entry.round, entry.text);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_facts_stay_private() {
        let mut memory = InMemoryMemory::new();
        memory.record_private(PlayerId(1), 1, "Player 9 is a werewolf");
        assert!(memory.summary(PlayerId(1)).contains("Player 9 is a werewolf"));
        assert!(memory.summary(PlayerId(2)).is_empty());
    }

    #[test]
    fn broadcast_skips_excluded_seats() {
        let mut memory = InMemoryMemory::new();
        let living = [PlayerId(1), PlayerId(2), PlayerId(3)];
        memory.broadcast(PlayerId(2), 2, "I am a villager", &living, &[PlayerId(3)]);
        assert!(memory.summary(PlayerId(1)).contains("Player 2 said: I am a villager"));
        assert_eq!(memory.entries(PlayerId(2)).len(), 1);
        assert!(memory.entries(PlayerId(3)).is_empty());
    }

    #[test]
    fn summary_keeps_most_recent_entries() {
        let mut memory = InMemoryMemory::new();
        for round in 0..50 {
            memory.record_private(PlayerId(4), round, &format!("note {round}"));
        }
        let summary = memory.summary(PlayerId(4));
        assert_eq!(summary.lines().count(), SUMMARY_WINDOW);
        assert!(summary.contains("note 49"));
        assert!(!summary.contains("note 9\n"));
    }
}
