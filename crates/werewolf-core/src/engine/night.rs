//! Night sub-phases: collect each role's intent, then resolve.

use serde_json::json;
use tracing::{debug, info};
use werewolf_types::{DecisionKind, GameEvent, InspectionResult, PlayerId, Role};

use super::{EngineError, Flow, GameEngine, seat_list};
use crate::consensus::Negotiation;
use crate::decision::{DecisionPort, fields};
use crate::resolver::resolve_night;
use crate::state::StateError;
use crate::victory::check_victory;

impl<D: DecisionPort> GameEngine<D> {
    pub(super) async fn guard_step(&mut self) -> Result<Flow, EngineError> {
        self.state.begin_night();
        let Some(guard) = self.state.living(Role::Guard) else {
            return Ok(Flow::Continue);
        };

        let last = self
            .state
            .participant(guard)
            .and_then(|p| p.last_protected);
        let options: Vec<PlayerId> = self
            .state
            .alive_ids()
            .into_iter()
            .filter(|p| Some(*p) != last)
            .collect();
        let decision = self
            .ask(
                guard,
                DecisionKind::GuardProtect,
                options.clone(),
                json!({ "last_protected": last }),
            )
            .await?;

        let target = decision.target(fields::TARGET, &options);
        self.state.night_mut().guard_target = target;
        self.state.set_last_protected(guard, target)?;
        self.emit(GameEvent::GuardProtected { guard, target });

        let round = self.state.round();
        let note = match target {
            Some(t) => format!("You protected Player {t} tonight."),
            None => String::from("You protected nobody tonight."),
        };
        self.memory.record_private(guard, round, &note);
        Ok(Flow::Continue)
    }

    pub(super) async fn wolf_step(&mut self) -> Result<Flow, EngineError> {
        let wolves = self.state.alive_wolves();
        let prey = self.state.alive_good();
        let Some(mut negotiation) = Negotiation::open(self.settings.consensus, wolves, prey) else {
            self.emit(GameEvent::WolfKillChosen {
                target: None,
                negotiation_rounds: 0,
                consensus: false,
            });
            return Ok(Flow::Continue);
        };

        let agreement = loop {
            for wolf in negotiation.members().to_vec() {
                let context = json!({
                    "negotiation_round": negotiation.round(),
                    "min_rounds": self.settings.consensus.min_rounds,
                    "max_rounds": self.settings.consensus.max_rounds,
                    "pack": negotiation.members(),
                    "transcript": negotiation.transcript_for(wolf),
                });
                let options = negotiation.valid_targets().to_vec();
                let decision = self
                    .ask(wolf, DecisionKind::WolfProposal, options, context)
                    .await?;

                let target = decision.target(fields::TARGET, negotiation.valid_targets());
                let rationale = decision
                    .text(fields::RATIONALE)
                    .unwrap_or_default()
                    .to_owned();
                let proposal = negotiation.propose(wolf, target, rationale, &mut self.rng);
                if proposal.substituted {
                    debug!(wolf = %wolf, target = %proposal.target, "Kill proposal substituted");
                }
                self.emit(GameEvent::WolfProposal {
                    wolf,
                    negotiation_round: proposal.round,
                    target: proposal.target,
                    rationale: proposal.rationale,
                    substituted: proposal.substituted,
                });
            }
            if let Some(agreement) = negotiation.close_round() {
                break agreement;
            }
        };

        self.state.night_mut().wolf_target = Some(agreement.target);
        info!(
            round = self.state.round(),
            target = %agreement.target,
            rounds = agreement.rounds,
            consensus = agreement.consensus,
            "Werewolves chose a kill"
        );
        self.emit(GameEvent::WolfKillChosen {
            target: Some(agreement.target),
            negotiation_rounds: agreement.rounds,
            consensus: agreement.consensus,
        });

        let how = if agreement.consensus {
            "by consensus"
        } else {
            "by forced decision"
        };
        let round = self.state.round();
        for &wolf in negotiation.members() {
            let last_round: Vec<String> = negotiation
                .log()
                .in_round(agreement.rounds)
                .iter()
                .map(|p| format!("Player {} wanted Player {}", p.member, p.target))
                .collect();
            let note = format!(
                "The pack agreed {how} after {} rounds to attack Player {}. Final round: {}.",
                agreement.rounds,
                agreement.target,
                last_round.join("; ")
            );
            self.memory.record_private(wolf, round, &note);
        }
        Ok(Flow::Continue)
    }

    pub(super) async fn witch_step(&mut self) -> Result<Flow, EngineError> {
        let Some(witch) = self.state.living(Role::Witch) else {
            return Ok(Flow::Continue);
        };
        let (heal_used, poison_used) = self
            .state
            .participant(witch)
            .map(|p| (p.heal_used, p.poison_used))
            .ok_or(StateError::UnknownPlayer { player: witch })?;

        let round = self.state.round();
        let victim = self.state.night().visible_victim();
        let can_heal = !heal_used && victim.is_some_and(|v| v != witch || round == 1);
        let poison_options: Vec<PlayerId> = if poison_used {
            Vec::new()
        } else {
            self.state.alive_ids()
        };

        let knife = match victim {
            Some(v) => format!("Tonight the werewolves attacked Player {v}."),
            None => String::from("Tonight nobody was attacked."),
        };
        self.memory.record_private(witch, round, &knife);

        let context = json!({
            "victim": victim,
            "can_heal": can_heal,
            "can_poison": !poison_options.is_empty(),
        });
        let decision = self
            .ask(witch, DecisionKind::WitchPotion, poison_options.clone(), context)
            .await?;

        let heal = can_heal && decision.flag(fields::HEAL);
        let poison_target = decision.target(fields::POISON_TARGET, &poison_options);
        let night = self.state.night_mut();
        night.heal = heal;
        night.poison_target = poison_target;
        self.emit(GameEvent::WitchActed {
            witch,
            healed: heal,
            poison_target,
        });

        if let (true, Some(v)) = (heal, victim) {
            self.memory
                .record_private(witch, round, &format!("You used the heal on Player {v}."));
        }
        if let Some(t) = poison_target {
            self.memory
                .record_private(witch, round, &format!("You poisoned Player {t}."));
        }
        Ok(Flow::Continue)
    }

    pub(super) async fn seer_step(&mut self) -> Result<Flow, EngineError> {
        let Some(seer) = self.state.living(Role::Seer) else {
            return Ok(Flow::Continue);
        };
        let options: Vec<PlayerId> = self
            .state
            .alive_ids()
            .into_iter()
            .filter(|p| *p != seer)
            .collect();
        let decision = self
            .ask(seer, DecisionKind::SeerInspect, options.clone(), json!({}))
            .await?;
        self.state.night_mut().inspect_target = decision.target(fields::TARGET, &options);
        Ok(Flow::Continue)
    }

    pub(super) fn resolve_step(&mut self) -> Result<Flow, EngineError> {
        let (outcome, applied) = resolve_night(&mut self.state)?;
        let round = self.state.round();

        if let Some(target) = outcome.blocked {
            self.emit(GameEvent::KillBlocked { target });
        }
        if outcome.empty_kill {
            self.emit(GameEvent::EmptyKill);
        }
        if let Some(target) = outcome.healed {
            self.emit(GameEvent::Healed { target });
        }
        for record in &applied {
            info!(round, player = %record.player, cause = %record.cause, "Participant died overnight");
            self.emit(GameEvent::Death {
                player: record.player,
                cause: record.cause,
            });
        }
        if applied.is_empty() {
            self.emit(GameEvent::PeacefulNight);
        }

        let seer = self
            .state
            .participants()
            .iter()
            .find(|p| p.role == Role::Seer)
            .map(|p| p.id);
        if let (Some(seer), Some((target, result))) = (seer, outcome.inspection) {
            self.emit(GameEvent::SeerInspected {
                seer,
                target,
                result,
            });
            let verdict = match result {
                InspectionResult::Wolf => "a werewolf",
                InspectionResult::NotWolf => "not a werewolf",
            };
            self.memory.record_private(
                seer,
                round,
                &format!("Your inspection: Player {target} is {verdict}."),
            );
        }

        if let Some(target) = self.state.night().wolf_target {
            let pack = self.state.alive_wolves();
            let note = format!(
                "Kill history: the pack attacked Player {target}; alive wolves now {}.",
                seat_list(&pack)
            );
            for wolf in pack {
                self.memory.record_private(wolf, round, &note);
            }
        }

        Ok(check_victory(&self.state).map_or(Flow::Continue, Flow::GameOver))
    }
}
