//! Round-one leadership election: register, campaign, vote.

use serde_json::json;
use tracing::info;
use werewolf_types::{DecisionKind, GameEvent, PlayerId, SpeechKind};

use super::day::SILENCE;
use super::{EngineError, Flow, GameEngine, seat_list};
use crate::decision::{DecisionPort, fields};
use crate::leadership::{Candidacy, Election, install};

impl<D: DecisionPort> GameEngine<D> {
    pub(super) async fn election_step(&mut self) -> Result<Flow, EngineError> {
        let round = self.state.round();
        let electorate = self.state.alive_ids();
        let mut election = Election::new();
        self.emit(GameEvent::ElectionStarted);

        for &player in &electorate {
            let decision = self
                .ask(
                    player,
                    DecisionKind::LeaderRegister,
                    Vec::new(),
                    json!({ "alive": electorate }),
                )
                .await?;
            let registered = decision.flag(fields::REGISTER);
            if registered {
                election.register(player);
            }
            self.emit(GameEvent::RegistrationDecided { player, registered });
        }
        self.emit(GameEvent::CandidatesAnnounced {
            candidates: election.registrants().to_vec(),
        });

        let (leader, tallies) = match election.candidacy() {
            Candidacy::Nobody => (None, Vec::new()),
            Candidacy::Unopposed(only) => (Some(only), Vec::new()),
            Candidacy::Contested(candidates) => {
                self.campaign(&candidates).await?;
                for &voter in &electorate {
                    let decision = self
                        .ask(
                            voter,
                            DecisionKind::LeaderVote,
                            candidates.clone(),
                            json!({ "candidates": candidates }),
                        )
                        .await?;
                    let choice = self.forced_choice(&decision, fields::VOTE_TARGET, &candidates);
                    let candidate = election.vote(voter, choice);
                    self.emit(GameEvent::ElectionVoteCast { voter, candidate });
                }
                let tally = election.conclude();
                (tally.winner(), tally.totals)
            }
        };

        if let Some(holder) = leader {
            install(&mut self.state, holder, round)?;
        }
        info!(round, leader = ?leader, candidates = election.registrants().len(), "Leadership election concluded");
        self.emit(GameEvent::ElectionResult { leader, tallies });

        let text = match (leader, election.registrants()) {
            (Some(holder), _) => format!("Player {holder} was elected leader."),
            (None, []) => String::from("Nobody ran for leader; there is no leader this game."),
            (None, running) => format!(
                "The leadership vote between {} produced no leader; there is no leader this game.",
                seat_list(running)
            ),
        };
        self.announce(&text);
        Ok(Flow::Continue)
    }

    async fn campaign(&mut self, candidates: &[PlayerId]) -> Result<(), EngineError> {
        for &candidate in candidates {
            let decision = self
                .ask(
                    candidate,
                    DecisionKind::LeaderSpeech,
                    Vec::new(),
                    json!({ "candidates": candidates }),
                )
                .await?;
            let content = decision.text(fields::SPEECH).unwrap_or(SILENCE).to_owned();
            self.emit(GameEvent::Speech {
                player: candidate,
                kind: SpeechKind::Campaign,
                content: content.clone(),
            });
            self.broadcast(candidate, &content);
        }
        Ok(())
    }
}
