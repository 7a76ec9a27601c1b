//! Day sub-phases after the election: announcement, last words,
//! discussion, the exile vote and the exiled participant's last words.

use serde_json::json;
use tracing::info;
use werewolf_types::{
    DeathCause, DecisionKind, GameEvent, PlayerId, SpeechKind, SpeechOrder,
};

use super::{EngineError, Flow, GameEngine, seat_list};
use crate::decision::{DecisionPort, fields};
use crate::phase::{is_permutation, speaking_order};
use crate::victory::check_victory;
use crate::voting::{Ballot, tally_exile};

/// Stand-in for a speech the agent did not provide.
pub(super) const SILENCE: &str = "......";

impl<D: DecisionPort> GameEngine<D> {
    pub(super) fn announce_step(&mut self) -> Flow {
        let dead: Vec<PlayerId> = self
            .state
            .overnight_deaths()
            .iter()
            .map(|d| d.player)
            .collect();
        let text = if dead.is_empty() {
            String::from("Dawn: the night was peaceful, nobody died.")
        } else {
            format!("Dawn: {} died during the night.", seat_list(&dead))
        };
        info!(round = self.state.round(), dead = ?dead, "Deaths announced");
        self.emit(GameEvent::DeathsAnnounced { dead });
        self.announce(&text);
        Flow::Continue
    }

    pub(super) async fn last_words_step(&mut self) -> Result<Flow, EngineError> {
        for record in self.state.overnight_deaths() {
            self.settle_death(record.player, record.cause).await?;
        }
        Ok(check_victory(&self.state).map_or(Flow::Continue, Flow::GameOver))
    }

    pub(super) async fn discussion_step(&mut self) -> Result<Flow, EngineError> {
        let order = self.arrange_speakers().await?;

        for speaker in order.iter().copied() {
            if !self.state.is_alive(speaker) {
                continue;
            }
            let is_wolf = self.state.is_wolf(speaker);
            let context = json!({
                "speech_order": order,
                "can_self_destruct": is_wolf,
            });
            let decision = self
                .ask(speaker, DecisionKind::DaySpeech, Vec::new(), context)
                .await?;

            if is_wolf && decision.flag(fields::EXPLODE) {
                if let Some(statement) = decision.text(fields::SPEECH) {
                    let statement = statement.to_owned();
                    self.emit(GameEvent::Speech {
                        player: speaker,
                        kind: SpeechKind::Discussion,
                        content: statement.clone(),
                    });
                    self.broadcast(speaker, &statement);
                }
                return self.self_destruct(speaker).await;
            }

            let content = decision.text(fields::SPEECH).unwrap_or(SILENCE).to_owned();
            self.emit(GameEvent::Speech {
                player: speaker,
                kind: SpeechKind::Discussion,
                content: content.clone(),
            });
            self.broadcast(speaker, &content);
        }
        Ok(Flow::Continue)
    }

    /// Compute today's order and let a living holder replace it once.
    pub(super) async fn arrange_speakers(&mut self) -> Result<Vec<PlayerId>, EngineError> {
        let round = self.state.round();
        if let Some(existing) = self.state.speech_order().filter(|o| o.round == round) {
            return Ok(existing.order.clone());
        }

        let alive = self.state.alive_ids();
        let overnight: Vec<PlayerId> = self
            .state
            .overnight_deaths()
            .iter()
            .map(|d| d.player)
            .collect();
        let mut order = speaking_order(&alive, round, &overnight, &mut self.rng);
        let mut overridden = false;

        let holder = self.state.leader().filter(|h| self.state.is_alive(*h));
        if let Some(holder) = holder {
            let decision = self
                .ask(
                    holder,
                    DecisionKind::LeaderSpeechOrder,
                    order.clone(),
                    json!({ "current_order": order }),
                )
                .await?;
            if let Some(proposed) = decision.order(fields::ORDER) {
                if proposed != order && is_permutation(&proposed, &order) {
                    order = proposed;
                    overridden = true;
                }
            }
        }

        self.state.set_speech_order(Some(SpeechOrder {
            round,
            order: order.clone(),
            overridden,
        }));
        self.emit(GameEvent::SpeechOrderSet {
            order: order.clone(),
            overridden,
        });
        Ok(order)
    }

    async fn self_destruct(&mut self, wolf: PlayerId) -> Result<Flow, EngineError> {
        if self.state.kill(wolf, DeathCause::SelfDestruct)?.is_some() {
            info!(round = self.state.round(), player = %wolf, "Werewolf self-destructed");
            self.emit(GameEvent::SelfDestructed { player: wolf });
            self.emit(GameEvent::Death {
                player: wolf,
                cause: DeathCause::SelfDestruct,
            });
            self.announce(&format!(
                "Player {wolf} revealed themselves as a werewolf and self-destructed. Night falls at once."
            ));
            self.settle_death(wolf, DeathCause::SelfDestruct).await?;
        }
        Ok(check_victory(&self.state).map_or(Flow::DayOver, Flow::GameOver))
    }

    pub(super) async fn vote_step(&mut self) -> Result<Flow, EngineError> {
        let alive = self.state.alive_ids();
        let leader = self.state.leader();
        let mut ballot = Ballot::new();

        for &voter in &alive {
            let options: Vec<PlayerId> = alive.iter().copied().filter(|p| *p != voter).collect();
            let decision = self
                .ask(
                    voter,
                    DecisionKind::ExileVote,
                    options.clone(),
                    json!({ "leader": leader }),
                )
                .await?;
            let target = self.forced_choice(&decision, fields::VOTE_TARGET, &options);
            if let Some(target) = target {
                ballot.cast(voter, target);
            }
            self.emit(GameEvent::VoteCast { voter, target });
        }

        let tally = tally_exile(&ballot, leader);
        let exiled = tally.winner();
        let tie = tally.is_tie();
        let round = self.state.round();
        info!(round, exiled = ?exiled, tie, votes = ballot.len(), "Exile vote tallied");

        let cast: Vec<String> = ballot
            .votes()
            .iter()
            .map(|(voter, target)| format!("{voter}->{target}"))
            .collect();
        let verdict = match exiled {
            Some(p) => format!("Player {p} was exiled."),
            None if tie => String::from("The vote tied; nobody was exiled."),
            None => String::from("Nobody voted; nobody was exiled."),
        };
        self.emit(GameEvent::VoteResult {
            tallies: tally.totals,
            exiled,
            tie,
        });
        self.announce(&format!("Votes: {}. {verdict}", cast.join(", ")));

        if let Some(player) = exiled {
            if self.state.kill(player, DeathCause::VoteExile)?.is_some() {
                self.emit(GameEvent::Death {
                    player,
                    cause: DeathCause::VoteExile,
                });
            }
        }
        // The exiled participant speaks (and may shoot) before the result
        // is decided in the exile-words step.
        Ok(Flow::Continue)
    }

    pub(super) async fn exile_words_step(&mut self) -> Result<Flow, EngineError> {
        let exiled: Vec<PlayerId> = self
            .state
            .deaths_in_round(self.state.round())
            .filter(|d| d.cause == DeathCause::VoteExile)
            .map(|d| d.player)
            .collect();
        for player in exiled {
            self.settle_death(player, DeathCause::VoteExile).await?;
        }
        Ok(check_victory(&self.state).map_or(Flow::Continue, Flow::GameOver))
    }
}
