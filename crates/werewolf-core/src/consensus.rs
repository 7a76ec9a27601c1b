//! Werewolf kill negotiation.
//!
//! Living Werewolves propose targets in ascending seat order, round after
//! round. Every proposal is appended to a [`ProposalLog`]; a member asked
//! to speak sees only what is already in the log, tagged as their own or a
//! teammate's. After each round past the minimum, a target backed by at
//! least half the members ends the negotiation. If the maximum round
//! passes without that, the final round's plurality wins, with ties going
//! to the lowest-seated member's proposal.
//!
//! [`Negotiation`] holds no decision logic of its own: the caller asks each
//! member and feeds the answer to [`Negotiation::propose`].

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use werewolf_types::PlayerId;

use crate::config::ConsensusConfig;

/// Round bounds for one negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsensusRules {
    /// Rounds always played before consensus is checked.
    pub min_rounds: u32,
    /// Round after which the decision is forced.
    pub max_rounds: u32,
}

impl Default for ConsensusRules {
    fn default() -> Self {
        ConsensusConfig::default().into()
    }
}

impl From<ConsensusConfig> for ConsensusRules {
    fn from(config: ConsensusConfig) -> Self {
        Self {
            min_rounds: config.min_rounds,
            max_rounds: config.max_rounds.max(config.min_rounds),
        }
    }
}

/// One recorded proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    /// Negotiation round, starting at 1.
    pub round: u32,
    /// Proposing member.
    pub member: PlayerId,
    /// Target, always inside the valid set.
    pub target: PlayerId,
    /// Stated reasoning.
    pub rationale: String,
    /// The member's own target was invalid and was replaced at random.
    pub substituted: bool,
}

/// Who made a transcript entry, from the reader's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "speaker", rename_all = "snake_case")]
pub enum Speaker {
    /// The member reading the transcript.
    You,
    /// Another member.
    Teammate {
        /// The teammate's seat.
        id: PlayerId,
    },
}

/// A proposal as shown to one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    /// Negotiation round.
    pub round: u32,
    /// Own or teammate.
    #[serde(flatten)]
    pub speaker: Speaker,
    /// Proposed target.
    pub target: PlayerId,
    /// Stated reasoning.
    pub rationale: String,
}

/// Append-only record of every proposal in a negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalLog {
    entries: Vec<Proposal>,
}

impl ProposalLog {
    /// Append a proposal.
    pub fn push(&mut self, proposal: Proposal) {
        self.entries.push(proposal);
    }

    /// All proposals in the order they were made.
    pub fn entries(&self) -> &[Proposal] {
        &self.entries
    }

    /// Proposals of one round, in speaking order.
    pub fn in_round(&self, round: u32) -> Vec<&Proposal> {
        self.entries.iter().filter(|p| p.round == round).collect()
    }

    /// The whole log as `reader` sees it.
    pub fn transcript_for(&self, reader: PlayerId) -> Vec<TranscriptEntry> {
        self.entries
            .iter()
            .map(|p| TranscriptEntry {
                round: p.round,
                speaker: if p.member == reader {
                    Speaker::You
                } else {
                    Speaker::Teammate { id: p.member }
                },
                target: p.target,
                rationale: p.rationale.clone(),
            })
            .collect()
    }
}

/// The negotiated kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Agreement {
    /// Agreed target.
    pub target: PlayerId,
    /// Rounds played.
    pub rounds: u32,
    /// `true` if reached by consensus, `false` if forced.
    pub consensus: bool,
}

/// A negotiation in progress.
#[derive(Debug, Clone)]
pub struct Negotiation {
    rules: ConsensusRules,
    members: Vec<PlayerId>,
    valid: Vec<PlayerId>,
    round: u32,
    log: ProposalLog,
}

impl Negotiation {
    /// Open a negotiation, or `None` if there is nobody to negotiate or
    /// nobody to kill.
    pub fn open(
        rules: ConsensusRules,
        mut members: Vec<PlayerId>,
        valid: Vec<PlayerId>,
    ) -> Option<Self> {
        if members.is_empty() || valid.is_empty() {
            return None;
        }
        members.sort_unstable();
        Some(Self {
            rules,
            members,
            valid,
            round: 1,
            log: ProposalLog::default(),
        })
    }

    /// Members in speaking order.
    pub fn members(&self) -> &[PlayerId] {
        &self.members
    }

    /// Targets a proposal may name.
    pub fn valid_targets(&self) -> &[PlayerId] {
        &self.valid
    }

    /// Current round, starting at 1.
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Everything proposed so far.
    pub const fn log(&self) -> &ProposalLog {
        &self.log
    }

    /// What `member` is shown before proposing.
    pub fn transcript_for(&self, member: PlayerId) -> Vec<TranscriptEntry> {
        self.log.transcript_for(member)
    }

    /// Record `member`'s proposal for the current round.
    ///
    /// A missing or invalid target is replaced by a uniformly random valid
    /// one before it is recorded.
    pub fn propose<R: Rng + ?Sized>(
        &mut self,
        member: PlayerId,
        target: Option<PlayerId>,
        rationale: String,
        rng: &mut R,
    ) -> Proposal {
        let chosen = target.filter(|t| self.valid.contains(t));
        let substituted = chosen.is_none();
        let target = chosen
            .or_else(|| self.valid.choose(rng).copied())
            .unwrap_or(member);
        let proposal = Proposal {
            round: self.round,
            member,
            target,
            rationale,
            substituted,
        };
        self.log.push(proposal.clone());
        proposal
    }

    /// Close the current round once every member has proposed.
    ///
    /// Returns the agreement if the negotiation is over, otherwise moves
    /// to the next round and returns `None`.
    pub fn close_round(&mut self) -> Option<Agreement> {
        let round = self.round;
        let proposals = self.log.in_round(round);

        if round > self.rules.min_rounds {
            if let Some(target) = check_consensus(&proposals, self.members.len()) {
                return Some(Agreement {
                    target,
                    rounds: round,
                    consensus: true,
                });
            }
        }
        if round >= self.rules.max_rounds {
            let target = force_decision(&proposals).or_else(|| self.valid.first().copied())?;
            return Some(Agreement {
                target,
                rounds: round,
                consensus: false,
            });
        }

        self.round = round.saturating_add(1);
        None
    }
}

/// Count proposals per target, keeping first-proposed order among equals.
fn counts(proposals: &[&Proposal]) -> Vec<(PlayerId, usize)> {
    let mut counts: Vec<(PlayerId, usize)> = Vec::new();
    for proposal in proposals {
        match counts.iter_mut().find(|(t, _)| *t == proposal.target) {
            Some(entry) => entry.1 = entry.1.saturating_add(1),
            None => counts.push((proposal.target, 1)),
        }
    }
    // Stable sort: equal counts stay in first-proposed order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// The most-backed target if its count is at least half of `members`.
///
/// Exactly half counts as consensus.
pub fn check_consensus(proposals: &[&Proposal], members: usize) -> Option<PlayerId> {
    let (target, count) = counts(proposals).into_iter().next()?;
    (count.saturating_mul(2) >= members).then_some(target)
}

/// Plurality target of a round; on a tie, the lowest-seated member's proposal.
pub fn force_decision(proposals: &[&Proposal]) -> Option<PlayerId> {
    let counts = counts(proposals);
    let (top_target, top_count) = counts.first().copied()?;
    let tied = counts.iter().filter(|(_, c)| *c == top_count).count();
    if tied == 1 {
        return Some(top_target);
    }
    proposals
        .iter()
        .min_by_key(|p| p.member)
        .map(|p| p.target)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const A: PlayerId = PlayerId(1);
    const B: PlayerId = PlayerId(2);
    const C: PlayerId = PlayerId(3);

    fn wolves() -> Vec<PlayerId> {
        vec![PlayerId(12), PlayerId(9), PlayerId(10), PlayerId(11)]
    }

    fn negotiation() -> Negotiation {
        Negotiation::open(ConsensusRules::default(), wolves(), vec![A, B, C]).unwrap()
    }

    /// Play one full round with the given targets, in member order.
    fn play_round(
        negotiation: &mut Negotiation,
        targets: &[PlayerId],
        rng: &mut StdRng,
    ) -> Option<Agreement> {
        let members = negotiation.members().to_vec();
        for (member, target) in members.iter().zip(targets) {
            negotiation.propose(*member, Some(*target), String::from("because"), rng);
        }
        negotiation.close_round()
    }

    #[test]
    fn members_speak_in_ascending_order() {
        let n = negotiation();
        assert_eq!(
            n.members(),
            &[PlayerId(9), PlayerId(10), PlayerId(11), PlayerId(12)]
        );
    }

    #[test]
    fn no_members_or_no_targets_means_no_negotiation() {
        assert!(Negotiation::open(ConsensusRules::default(), vec![], vec![A]).is_none());
        assert!(Negotiation::open(ConsensusRules::default(), wolves(), vec![]).is_none());
    }

    #[test]
    fn unanimity_before_minimum_does_not_stop() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut n = negotiation();
        assert_eq!(play_round(&mut n, &[A, A, A, A], &mut rng), None);
        assert_eq!(play_round(&mut n, &[A, A, A, A], &mut rng), None);
        assert_eq!(n.round(), 3);
    }

    #[test]
    fn half_the_members_is_consensus_at_round_three() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut n = negotiation();
        play_round(&mut n, &[A, B, C, A], &mut rng);
        play_round(&mut n, &[B, B, C, A], &mut rng);
        let agreement = play_round(&mut n, &[A, A, B, C], &mut rng).unwrap();
        assert_eq!(
            agreement,
            Agreement {
                target: A,
                rounds: 3,
                consensus: true
            }
        );
        // No round 4 was opened.
        assert!(n.log().in_round(4).is_empty());
        assert_eq!(n.round(), 3);
    }

    #[test]
    fn split_rounds_force_decision_at_six() {
        let mut rng = StdRng::seed_from_u64(0);
        let (d, e) = (PlayerId(4), PlayerId(5));
        let members = (8..=12).map(PlayerId).collect();
        let mut n =
            Negotiation::open(ConsensusRules::default(), members, vec![A, B, C, d, e]).unwrap();
        for _ in 0..5 {
            assert!(play_round(&mut n, &[A, B, C, d, e], &mut rng).is_none());
        }
        assert_eq!(n.round(), 6);
        // Final round: 8->B, 9->A, 10->B, 11->A, 12->C. B and A tie 2-2,
        // short of half of five; seat 8 proposed B.
        let agreement = play_round(&mut n, &[B, A, B, A, C], &mut rng).unwrap();
        assert_eq!(agreement.target, B);
        assert_eq!(agreement.rounds, 6);
        assert!(!agreement.consensus);
    }

    #[test]
    fn forced_tie_goes_to_lowest_seat() {
        let p = |member: u8, target: PlayerId| Proposal {
            round: 6,
            member: PlayerId(member),
            target,
            rationale: String::new(),
            substituted: false,
        };
        let round = [p(12, A), p(9, B), p(10, A), p(11, B)];
        let refs: Vec<&Proposal> = round.iter().collect();
        assert_eq!(force_decision(&refs), Some(B));
    }

    #[test]
    fn forced_plurality_uses_final_round_only() {
        let p = |member: u8, target: PlayerId| Proposal {
            round: 6,
            member: PlayerId(member),
            target,
            rationale: String::new(),
            substituted: false,
        };
        let round = [p(9, A), p(10, C), p(11, C), p(12, B)];
        let refs: Vec<&Proposal> = round.iter().collect();
        assert_eq!(force_decision(&refs), Some(C));
    }

    #[test]
    fn invalid_proposal_is_replaced_with_valid_target() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut n = negotiation();
        let proposal = n.propose(PlayerId(9), Some(PlayerId(10)), String::new(), &mut rng);
        assert!(proposal.substituted);
        assert!(n.valid_targets().contains(&proposal.target));
        let missing = n.propose(PlayerId(10), None, String::new(), &mut rng);
        assert!(missing.substituted);
        assert!(n.valid_targets().contains(&missing.target));
    }

    #[test]
    fn transcript_tags_own_and_teammate_entries() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut n = negotiation();
        assert!(n.transcript_for(PlayerId(9)).is_empty());
        n.propose(PlayerId(9), Some(A), String::from("quiet one"), &mut rng);
        n.propose(PlayerId(10), Some(B), String::from("seer claim"), &mut rng);

        let seen_by_ten = n.transcript_for(PlayerId(10));
        assert_eq!(seen_by_ten.len(), 2);
        assert_eq!(
            seen_by_ten.first().map(|e| e.speaker),
            Some(Speaker::Teammate { id: PlayerId(9) })
        );
        assert_eq!(seen_by_ten.get(1).map(|e| e.speaker), Some(Speaker::You));
    }

    #[test]
    fn single_wolf_agrees_with_itself_after_minimum() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut n =
            Negotiation::open(ConsensusRules::default(), vec![PlayerId(9)], vec![A, B]).unwrap();
        assert!(play_round(&mut n, &[B], &mut rng).is_none());
        assert!(play_round(&mut n, &[B], &mut rng).is_none());
        let agreement = play_round(&mut n, &[B], &mut rng).unwrap();
        assert_eq!(agreement.target, B);
        assert!(agreement.consensus);
    }
}
