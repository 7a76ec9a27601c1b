//! What follows a death: last words, badge succession, retaliation.
//!
//! Every death runs through [`GameEngine::settle_death`] in the same order:
//! last words (if the cause and round grant them), then succession if the
//! dead participant held the badge, then the Hunter's shot if it is still
//! available. The shot's victim gets last words and succession but cannot
//! trigger another shot, since only one Hunter is ever dealt.

use serde_json::json;
use tracing::info;
use werewolf_types::{DeathCause, DecisionKind, GameEvent, PlayerId, SpeechKind};

use super::day::SILENCE;
use super::{EngineError, GameEngine};
use crate::decision::{DecisionPort, fields};
use crate::last_words::has_last_words;
use crate::leadership::{Succession, apply_succession, may_nominate, rule_succession};

impl<D: DecisionPort> GameEngine<D> {
    pub(super) async fn settle_death(
        &mut self,
        player: PlayerId,
        cause: DeathCause,
    ) -> Result<(), EngineError> {
        self.bury(player, cause).await?;

        let armed = self
            .state
            .participant(player)
            .is_some_and(|p| p.role.can_retaliate() && p.can_retaliate);
        if armed {
            self.retaliate(player).await?;
        }
        Ok(())
    }

    /// Last words and succession, without retaliation.
    async fn bury(&mut self, player: PlayerId, cause: DeathCause) -> Result<(), EngineError> {
        if has_last_words(cause, self.state.round()) {
            self.last_words(player, cause).await?;
        }
        if self.state.leader() == Some(player) {
            self.succession(player, cause).await?;
        }
        Ok(())
    }

    async fn last_words(&mut self, player: PlayerId, cause: DeathCause) -> Result<(), EngineError> {
        let decision = self
            .ask(
                player,
                DecisionKind::LastWords,
                Vec::new(),
                json!({ "cause": cause }),
            )
            .await?;
        let content = decision.text(fields::SPEECH).unwrap_or(SILENCE).to_owned();
        self.emit(GameEvent::Speech {
            player,
            kind: SpeechKind::LastWords,
            content: content.clone(),
        });
        self.broadcast(player, &content);
        Ok(())
    }

    async fn succession(&mut self, holder: PlayerId, cause: DeathCause) -> Result<(), EngineError> {
        let nominee = if may_nominate(cause, self.state.round()) {
            let options = self.state.alive_ids();
            let decision = self
                .ask(
                    holder,
                    DecisionKind::LeaderSuccession,
                    options.clone(),
                    json!({ "cause": cause }),
                )
                .await?;
            decision.target(fields::SUCCESSOR, &options)
        } else {
            None
        };

        let ruling = rule_succession(&self.state, holder, cause, nominee);
        apply_succession(&mut self.state, ruling)?;
        match ruling {
            Succession::Transfer { from, to } => {
                info!(from = %from, to = %to, "Leadership transferred");
                self.emit(GameEvent::LeadershipTransferred { from, to });
                self.announce(&format!("Player {from} passed the leadership badge to Player {to}."));
            }
            Succession::Destroyed { holder } => {
                info!(holder = %holder, "Leadership badge destroyed");
                self.emit(GameEvent::LeadershipDestroyed { holder });
                self.announce(&format!("The leadership badge of Player {holder} was destroyed."));
            }
        }
        Ok(())
    }

    async fn retaliate(&mut self, hunter: PlayerId) -> Result<(), EngineError> {
        self.state.spend_retaliation(hunter)?;
        let options = self.state.alive_ids();
        let decision = self
            .ask(hunter, DecisionKind::RetaliationShot, options.clone(), json!({}))
            .await?;
        let target = decision.target(fields::TARGET, &options);
        self.emit(GameEvent::RetaliationShot {
            shooter: hunter,
            target,
        });

        let Some(target) = target else {
            return Ok(());
        };
        if self.state.kill(target, DeathCause::RetaliationShot)?.is_none() {
            return Ok(());
        }
        info!(shooter = %hunter, target = %target, "Hunter retaliated");
        self.emit(GameEvent::Death {
            player: target,
            cause: DeathCause::RetaliationShot,
        });
        self.announce(&format!("Player {hunter} was the Hunter and shot Player {target}."));
        self.bury(target, DeathCause::RetaliationShot).await
    }
}
