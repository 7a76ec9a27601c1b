//! Leadership badge: the round-one election and death-triggered succession.
//!
//! This module is the only writer of the leadership record. The engine
//! drives the decision calls; [`Election`] and [`rule_succession`] decide
//! what those answers mean.

use werewolf_types::{DeathCause, Leadership, PlayerId};

use crate::last_words::has_last_words;
use crate::state::{GameState, StateError};
use crate::voting::{Ballot, Tally, tally_unweighted};

/// Who is running once registration closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidacy {
    /// Nobody registered; there is no holder this game.
    Nobody,
    /// Exactly one registrant, elected without a vote.
    Unopposed(PlayerId),
    /// Two or more registrants, in registration order.
    Contested(Vec<PlayerId>),
}

/// State of one leadership election.
#[derive(Debug, Clone, Default)]
pub struct Election {
    registrants: Vec<PlayerId>,
    ballot: Ballot,
}

impl Election {
    /// An election with no registrants.
    pub const fn new() -> Self {
        Self {
            registrants: Vec::new(),
            ballot: Ballot::new(),
        }
    }

    /// Add a registrant. Registering twice is a no-op.
    pub fn register(&mut self, player: PlayerId) {
        if !self.registrants.contains(&player) {
            self.registrants.push(player);
        }
    }

    /// Registrants in registration order.
    pub fn registrants(&self) -> &[PlayerId] {
        &self.registrants
    }

    /// Outcome of registration.
    pub fn candidacy(&self) -> Candidacy {
        match self.registrants.as_slice() {
            [] => Candidacy::Nobody,
            [only] => Candidacy::Unopposed(*only),
            many => Candidacy::Contested(many.to_vec()),
        }
    }

    /// Record a vote. Choices outside the registrants are abstentions.
    ///
    /// Returns the accepted candidate.
    pub fn vote(&mut self, voter: PlayerId, choice: Option<PlayerId>) -> Option<PlayerId> {
        let candidate = choice.filter(|c| self.registrants.contains(c))?;
        self.ballot.cast(voter, candidate);
        Some(candidate)
    }

    /// Unweighted tally of the votes cast so far.
    pub fn conclude(&self) -> Tally {
        tally_unweighted(&self.ballot)
    }
}

/// Give the badge to `holder`.
///
/// # Errors
///
/// Returns [`StateError::UnknownPlayer`] if the seat does not exist.
pub fn install(state: &mut GameState, holder: PlayerId, round: u32) -> Result<(), StateError> {
    state.set_leadership(Some(Leadership {
        holder,
        elected_round: round,
    }))
}

/// What happens to the badge when its holder dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Succession {
    /// The badge passes to a living participant.
    Transfer {
        /// Dead holder.
        from: PlayerId,
        /// New holder.
        to: PlayerId,
    },
    /// The badge leaves the game.
    Destroyed {
        /// Dead holder.
        holder: PlayerId,
    },
}

/// Whether the dying holder is asked to nominate a successor at all.
pub const fn may_nominate(cause: DeathCause, round: u32) -> bool {
    has_last_words(cause, round)
}

/// Decide the badge's fate.
///
/// A holder without last words loses the badge outright. Otherwise a
/// living nominee other than the holder receives it; anything else
/// destroys it.
pub fn rule_succession(
    state: &GameState,
    holder: PlayerId,
    cause: DeathCause,
    nominee: Option<PlayerId>,
) -> Succession {
    if !may_nominate(cause, state.round()) {
        return Succession::Destroyed { holder };
    }
    match nominee {
        Some(to) if to != holder && state.is_alive(to) => Succession::Transfer { from: holder, to },
        _ => Succession::Destroyed { holder },
    }
}

/// Write a succession ruling into the entity store.
///
/// # Errors
///
/// Returns [`StateError::UnknownPlayer`] if the successor's seat does not exist.
pub fn apply_succession(state: &mut GameState, ruling: Succession) -> Result<(), StateError> {
    match ruling {
        Succession::Transfer { to, .. } => {
            let round = state.round();
            install(state, to, round)
        }
        Succession::Destroyed { .. } => state.set_leadership(None),
    }
}
