//! Ballots and weighted tallies.
//!
//! Weights are summed in half-votes: an ordinary vote counts 2, the
//! leadership holder's ballot in the main exile vote counts 3 (1.5 votes).
//! Election ballots are always unweighted. Only a strict maximum decides;
//! a shared maximum or an empty ballot decides nothing.

use std::collections::BTreeMap;

use werewolf_types::{PlayerId, VoteTally};

/// Weight of an ordinary vote, in half-votes.
pub const NORMAL_WEIGHT: u32 = 2;

/// Weight of the holder's main-vote ballot, in half-votes.
pub const LEADER_WEIGHT: u32 = 3;

/// Voter to target mapping. Abstentions are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ballot {
    votes: Vec<(PlayerId, PlayerId)>,
}

impl Ballot {
    /// An empty ballot.
    pub const fn new() -> Self {
        Self { votes: Vec::new() }
    }

    /// Record `voter`'s choice, replacing any earlier choice by the same voter.
    pub fn cast(&mut self, voter: PlayerId, target: PlayerId) {
        match self.votes.iter_mut().find(|(v, _)| *v == voter) {
            Some(entry) => entry.1 = target,
            None => self.votes.push((voter, target)),
        }
    }

    /// Votes in the order they were cast.
    pub fn votes(&self) -> &[(PlayerId, PlayerId)] {
        &self.votes
    }

    /// Whether nobody voted.
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Number of votes cast.
    pub fn len(&self) -> usize {
        self.votes.len()
    }
}

impl FromIterator<(PlayerId, PlayerId)> for Ballot {
    fn from_iter<I: IntoIterator<Item = (PlayerId, PlayerId)>>(iter: I) -> Self {
        let mut ballot = Self::new();
        for (voter, target) in iter {
            ballot.cast(voter, target);
        }
        ballot
    }
}

/// What a tally decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// A single target has the strictly highest total.
    Decided(PlayerId),
    /// Several targets share the highest total.
    Tie(Vec<PlayerId>),
    /// Nobody voted.
    NoVotes,
}

/// Totals plus the decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// What was decided.
    pub outcome: VoteOutcome,
    /// Totals per target, highest first, ties in seat order.
    pub totals: Vec<VoteTally>,
}

impl Tally {
    /// The decided target, if any.
    pub const fn winner(&self) -> Option<PlayerId> {
        match &self.outcome {
            VoteOutcome::Decided(target) => Some(*target),
            VoteOutcome::Tie(_) | VoteOutcome::NoVotes => None,
        }
    }

    /// Whether the maximum was shared.
    pub const fn is_tie(&self) -> bool {
        matches!(self.outcome, VoteOutcome::Tie(_))
    }
}

/// Tally the day's main exile vote; `leader`'s ballot weighs 1.5.
pub fn tally_exile(ballot: &Ballot, leader: Option<PlayerId>) -> Tally {
    tally_weighted(ballot, |voter| {
        if Some(voter) == leader {
            LEADER_WEIGHT
        } else {
            NORMAL_WEIGHT
        }
    })
}

/// Tally an election; every ballot weighs 1.
pub fn tally_unweighted(ballot: &Ballot) -> Tally {
    tally_weighted(ballot, |_| NORMAL_WEIGHT)
}

fn tally_weighted(ballot: &Ballot, weight: impl Fn(PlayerId) -> u32) -> Tally {
    let mut sums: BTreeMap<PlayerId, u32> = BTreeMap::new();
    for &(voter, target) in ballot.votes() {
        let total = sums.entry(target).or_insert(0);
        *total = total.saturating_add(weight(voter));
    }

    let mut totals: Vec<VoteTally> = sums
        .into_iter()
        .map(|(target, half_votes)| VoteTally { target, half_votes })
        .collect();
    totals.sort_by(|a, b| b.half_votes.cmp(&a.half_votes).then(a.target.cmp(&b.target)));

    let outcome = match totals.first() {
        None => VoteOutcome::NoVotes,
        Some(top) => {
            let leaders: Vec<PlayerId> = totals
                .iter()
                .take_while(|t| t.half_votes == top.half_votes)
                .map(|t| t.target)
                .collect();
            match leaders.as_slice() {
                [single] => VoteOutcome::Decided(*single),
                _ => VoteOutcome::Tie(leaders),
            }
        }
    };

    Tally { outcome, totals }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballot(votes: &[(u8, u8)]) -> Ballot {
        votes
            .iter()
            .map(|&(voter, target)| (PlayerId(voter), PlayerId(target)))
            .collect()
    }

    fn total_for(tally: &Tally, seat: u8) -> Option<u32> {
        tally
            .totals
            .iter()
            .find(|t| t.target == PlayerId(seat))
            .map(|t| t.half_votes)
    }

    #[test]
    fn leader_vote_weighs_one_and_a_half() {
        let tally = tally_exile(&ballot(&[(1, 3), (2, 3), (3, 1)]), Some(PlayerId(2)));
        assert_eq!(total_for(&tally, 3), Some(5));
        assert_eq!(total_for(&tally, 1), Some(2));
        assert_eq!(tally.winner(), Some(PlayerId(3)));
    }

    #[test]
    fn leader_weight_breaks_what_would_be_a_tie() {
        let votes = ballot(&[(1, 5), (2, 6)]);
        assert!(tally_exile(&votes, None).is_tie());
        assert_eq!(tally_exile(&votes, Some(PlayerId(2))).winner(), Some(PlayerId(6)));
    }

    #[test]
    fn tie_at_maximum_exiles_nobody() {
        let tally = tally_exile(&ballot(&[(1, 4), (2, 4), (3, 7), (5, 7), (6, 8)]), None);
        assert_eq!(tally.outcome, VoteOutcome::Tie(vec![PlayerId(4), PlayerId(7)]));
        assert_eq!(tally.winner(), None);
    }

    #[test]
    fn empty_ballot_exiles_nobody() {
        let tally = tally_exile(&Ballot::new(), Some(PlayerId(1)));
        assert_eq!(tally.outcome, VoteOutcome::NoVotes);
        assert!(tally.totals.is_empty());
    }

    #[test]
    fn election_ignores_leader_weight() {
        let tally = tally_unweighted(&ballot(&[(1, 3), (2, 4)]));
        assert!(tally.is_tie());
    }

    #[test]
    fn recasting_replaces_previous_vote() {
        let mut votes = Ballot::new();
        votes.cast(PlayerId(1), PlayerId(2));
        votes.cast(PlayerId(1), PlayerId(3));
        assert_eq!(votes.len(), 1);
        assert_eq!(tally_unweighted(&votes).winner(), Some(PlayerId(3)));
    }

    #[test]
    fn totals_are_sorted_highest_first() {
        let tally = tally_unweighted(&ballot(&[(1, 9), (2, 4), (3, 4)]));
        let order: Vec<PlayerId> = tally.totals.iter().map(|t| t.target).collect();
        assert_eq!(order, vec![PlayerId(4), PlayerId(9)]);
    }
}
