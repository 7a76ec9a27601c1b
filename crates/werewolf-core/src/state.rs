//! The entity store: participants, round cursor, leadership and night intents.
//!
//! [`GameState`] is owned by the phase engine. Everything else reads it
//! through queries; mutation happens through a small set of primitives,
//! most of them crate-private so that only the engine and the leadership
//! subsystem can move the cursor or the badge.

use rand::Rng;
use rand::seq::SliceRandom;
use werewolf_types::{
    DeathCause, DeathRecord, GameId, GameSnapshot, GameStatus, Leadership, NightIntents,
    Participant, Phase, PlayerId, Role, SpeechOrder, SubPhase, Winner,
};

/// Number of seats at the table.
pub const PLAYER_COUNT: usize = 12;

/// Structural invariant violations. Fatal at construction or restore.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Wrong number of seats.
    #[error("expected {expected} participants, found {found}")]
    PlayerCount {
        /// Required seat count.
        expected: usize,
        /// Seats supplied.
        found: usize,
    },

    /// A role was dealt the wrong number of times.
    #[error("role {role} dealt {found} times, expected {expected}")]
    RoleCount {
        /// Offending role.
        role: Role,
        /// Required count.
        expected: usize,
        /// Actual count.
        found: usize,
    },

    /// Seats are not numbered 1..=12 in order.
    #[error("seat {found} found where seat {expected} was expected")]
    SeatOrder {
        /// Seat that belongs at this position.
        expected: PlayerId,
        /// Seat actually found.
        found: PlayerId,
    },

    /// More than one participant carries the badge.
    #[error("{count} participants flagged as leadership holder")]
    DuplicateLeadership {
        /// Number of flagged participants.
        count: usize,
    },

    /// Badge flags disagree with the leadership record.
    #[error("leadership record and badge flag disagree for participant {holder}")]
    LeadershipMismatch {
        /// Participant named by the record or the flag.
        holder: PlayerId,
    },

    /// No participant sits in this seat.
    #[error("unknown participant {player}")]
    UnknownPlayer {
        /// The seat looked up.
        player: PlayerId,
    },

    /// Alive flags disagree with the death log.
    #[error("death log disagrees with participant {player}")]
    DeathLogMismatch {
        /// The inconsistent participant.
        player: PlayerId,
    },
}

/// In-memory record of one game.
#[derive(Debug, Clone)]
pub struct GameState {
    game_id: GameId,
    status: GameStatus,
    round: u32,
    phase: Phase,
    sub_phase: Option<SubPhase>,
    participants: Vec<Participant>,
    deaths: Vec<DeathRecord>,
    leadership: Option<Leadership>,
    speech_order: Option<SpeechOrder>,
    night: NightIntents,
    winner: Option<Winner>,
}

impl GameState {
    /// Deal the standard twelve roles to seats 1..=12 in random order.
    pub fn deal<R: Rng + ?Sized>(game_id: GameId, rng: &mut R) -> Self {
        let mut roles = Role::STANDARD_DEAL;
        roles.shuffle(rng);
        Self::seated(game_id, &roles)
    }

    /// Seat the given roles in order (seat 1 gets `roles[0]`).
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] unless `roles` is a permutation of the
    /// standard deal.
    pub fn with_roles(game_id: GameId, roles: &[Role]) -> Result<Self, StateError> {
        validate_distribution(roles)?;
        Ok(Self::seated(game_id, roles))
    }

    fn seated(game_id: GameId, roles: &[Role]) -> Self {
        let participants = roles
            .iter()
            .zip(1_u8..)
            .map(|(role, seat)| Participant::new(PlayerId(seat), *role))
            .collect();
        Self {
            game_id,
            status: GameStatus::Created,
            round: 1,
            phase: Phase::Start,
            sub_phase: None,
            participants,
            deaths: Vec::new(),
            leadership: None,
            speech_order: None,
            night: NightIntents::default(),
            winner: None,
        }
    }

    /// Rebuild a game from a snapshot, re-checking every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the snapshot is internally inconsistent.
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Result<Self, StateError> {
        let roles: Vec<Role> = snapshot.participants.iter().map(|p| p.role).collect();
        validate_distribution(&roles)?;

        for (participant, seat) in snapshot.participants.iter().zip(1_u8..) {
            if participant.id != PlayerId(seat) {
                return Err(StateError::SeatOrder {
                    expected: PlayerId(seat),
                    found: participant.id,
                });
            }
            let logged: Vec<&DeathRecord> = snapshot
                .deaths
                .iter()
                .filter(|d| d.player == participant.id)
                .collect();
            let consistent = match (participant.alive, logged.as_slice()) {
                (true, []) => true,
                (false, [record]) => {
                    participant.death_cause == Some(record.cause)
                        && participant.death_round == Some(record.round)
                }
                _ => false,
            };
            if !consistent {
                return Err(StateError::DeathLogMismatch {
                    player: participant.id,
                });
            }
        }

        let flagged: Vec<PlayerId> = snapshot
            .participants
            .iter()
            .filter(|p| p.is_leader)
            .map(|p| p.id)
            .collect();
        if flagged.len() > 1 {
            return Err(StateError::DuplicateLeadership {
                count: flagged.len(),
            });
        }
        match (snapshot.leadership, flagged.first()) {
            (None, None) => {}
            (Some(record), Some(&flag)) if record.holder == flag => {}
            (Some(record), _) => {
                return Err(StateError::LeadershipMismatch {
                    holder: record.holder,
                });
            }
            (None, Some(&flag)) => {
                return Err(StateError::LeadershipMismatch { holder: flag });
            }
        }

        Ok(Self {
            game_id: snapshot.game_id,
            status: snapshot.status,
            round: snapshot.round,
            phase: snapshot.phase,
            sub_phase: snapshot.sub_phase,
            participants: snapshot.participants.clone(),
            deaths: snapshot.deaths.clone(),
            leadership: snapshot.leadership,
            speech_order: snapshot.speech_order.clone(),
            night: snapshot.night.clone(),
            winner: snapshot.winner,
        })
    }

    /// Serializable copy of the whole state.
    pub fn to_snapshot(&self, next_sequence: u64) -> GameSnapshot {
        GameSnapshot {
            game_id: self.game_id,
            status: self.status,
            round: self.round,
            phase: self.phase,
            sub_phase: self.sub_phase,
            participants: self.participants.clone(),
            deaths: self.deaths.clone(),
            leadership: self.leadership,
            speech_order: self.speech_order.clone(),
            night: self.night.clone(),
            winner: self.winner,
            next_sequence,
            saved_at: chrono::Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Game identifier.
    pub const fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Lifecycle status.
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Current round, starting at 1.
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Sub-phase about to run (or running).
    pub const fn sub_phase(&self) -> Option<SubPhase> {
        self.sub_phase
    }

    /// Result, once recorded.
    pub const fn winner(&self) -> Option<Winner> {
        self.winner
    }

    /// All participants in seat order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Look up a participant by seat.
    pub fn participant(&self, id: PlayerId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Role of a seat, if the seat exists.
    pub fn role_of(&self, id: PlayerId) -> Option<Role> {
        self.participant(id).map(|p| p.role)
    }

    /// Whether the seat exists and its occupant is alive.
    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.participant(id).is_some_and(|p| p.alive)
    }

    /// Whether the seat exists and holds a Werewolf.
    pub fn is_wolf(&self, id: PlayerId) -> bool {
        self.participant(id).is_some_and(Participant::is_wolf)
    }

    /// Living seats in ascending order.
    pub fn alive_ids(&self) -> Vec<PlayerId> {
        self.participants
            .iter()
            .filter(|p| p.alive)
            .map(|p| p.id)
            .collect()
    }

    /// Living seats holding `role`, ascending.
    pub fn alive_with_role(&self, role: Role) -> Vec<PlayerId> {
        self.participants
            .iter()
            .filter(|p| p.alive && p.role == role)
            .map(|p| p.id)
            .collect()
    }

    /// The living holder of a single-seat role, if any.
    pub fn living(&self, role: Role) -> Option<PlayerId> {
        self.participants
            .iter()
            .find(|p| p.alive && p.role == role)
            .map(|p| p.id)
    }

    /// Living Werewolves, ascending.
    pub fn alive_wolves(&self) -> Vec<PlayerId> {
        self.participants
            .iter()
            .filter(|p| p.alive && p.is_wolf())
            .map(|p| p.id)
            .collect()
    }

    /// Living Good-faction participants, ascending.
    pub fn alive_good(&self) -> Vec<PlayerId> {
        self.participants
            .iter()
            .filter(|p| p.alive && !p.is_wolf())
            .map(|p| p.id)
            .collect()
    }

    /// Death log in application order.
    pub fn deaths(&self) -> &[DeathRecord] {
        &self.deaths
    }

    /// Deaths recorded in `round`, in application order.
    pub fn deaths_in_round(&self, round: u32) -> impl Iterator<Item = &DeathRecord> {
        self.deaths.iter().filter(move |d| d.round == round)
    }

    /// Deaths from the current round's night, in seat order.
    pub fn overnight_deaths(&self) -> Vec<DeathRecord> {
        let mut deaths: Vec<DeathRecord> = self
            .deaths_in_round(self.round)
            .filter(|d| matches!(d.cause, DeathCause::WolfKill | DeathCause::Poison))
            .copied()
            .collect();
        deaths.sort_by_key(|d| d.player);
        deaths
    }

    /// Current leadership record.
    pub const fn leadership(&self) -> Option<Leadership> {
        self.leadership
    }

    /// Current badge holder.
    pub fn leader(&self) -> Option<PlayerId> {
        self.leadership.map(|l| l.holder)
    }

    /// Today's speaking order, once computed.
    pub const fn speech_order(&self) -> Option<&SpeechOrder> {
        self.speech_order.as_ref()
    }

    /// Intents collected so far this night.
    pub const fn night(&self) -> &NightIntents {
        &self.night
    }

    // -----------------------------------------------------------------------
    // Deaths and role resources
    // -----------------------------------------------------------------------

    /// Kill a participant in the current round.
    ///
    /// Idempotent: an already-dead participant is left untouched and
    /// `Ok(None)` is returned. Poison also removes the retaliation shot.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownPlayer`] for a seat that does not exist.
    pub fn kill(
        &mut self,
        player: PlayerId,
        cause: DeathCause,
    ) -> Result<Option<DeathRecord>, StateError> {
        let round = self.round;
        let participant = self.participant_mut(player)?;
        if !participant.alive {
            return Ok(None);
        }
        participant.alive = false;
        participant.death_cause = Some(cause);
        participant.death_round = Some(round);
        if cause == DeathCause::Poison {
            participant.can_retaliate = false;
        }
        let record = DeathRecord {
            player,
            round,
            cause,
        };
        self.deaths.push(record);
        Ok(Some(record))
    }

    pub(crate) fn use_heal(&mut self, witch: PlayerId) -> Result<(), StateError> {
        self.participant_mut(witch)?.heal_used = true;
        Ok(())
    }

    pub(crate) fn use_poison(&mut self, witch: PlayerId) -> Result<(), StateError> {
        self.participant_mut(witch)?.poison_used = true;
        Ok(())
    }

    pub(crate) fn set_last_protected(
        &mut self,
        guard: PlayerId,
        target: Option<PlayerId>,
    ) -> Result<(), StateError> {
        self.participant_mut(guard)?.last_protected = target;
        Ok(())
    }

    pub(crate) fn spend_retaliation(&mut self, hunter: PlayerId) -> Result<(), StateError> {
        self.participant_mut(hunter)?.can_retaliate = false;
        Ok(())
    }

    fn participant_mut(&mut self, id: PlayerId) -> Result<&mut Participant, StateError> {
        self.participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StateError::UnknownPlayer { player: id })
    }

    // -----------------------------------------------------------------------
    // Leadership (only the leadership subsystem calls this)
    // -----------------------------------------------------------------------

    pub(crate) fn set_leadership(
        &mut self,
        leadership: Option<Leadership>,
    ) -> Result<(), StateError> {
        if let Some(record) = leadership {
            if self.participant(record.holder).is_none() {
                return Err(StateError::UnknownPlayer {
                    player: record.holder,
                });
            }
        }
        for participant in &mut self.participants {
            participant.is_leader = leadership.is_some_and(|l| l.holder == participant.id);
        }
        self.leadership = leadership;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Cursor and per-phase scratch (only the phase engine calls these)
    // -----------------------------------------------------------------------

    pub(crate) const fn set_cursor(&mut self, phase: Phase, sub_phase: Option<SubPhase>) {
        self.phase = phase;
        self.sub_phase = sub_phase;
    }

    pub(crate) const fn advance_round(&mut self) -> u32 {
        self.round = self.round.saturating_add(1);
        self.round
    }

    pub(crate) fn begin_night(&mut self) {
        self.night = NightIntents::default();
    }

    pub(crate) const fn night_mut(&mut self) -> &mut NightIntents {
        &mut self.night
    }

    pub(crate) fn set_speech_order(&mut self, order: Option<SpeechOrder>) {
        self.speech_order = order;
    }

    pub(crate) const fn mark_running(&mut self) {
        self.status = GameStatus::Running;
    }

    pub(crate) const fn finish(&mut self, winner: Winner) {
        self.winner = Some(winner);
        self.status = GameStatus::Finished;
        self.phase = Phase::End;
        self.sub_phase = None;
    }

    pub(crate) const fn fail(&mut self) {
        self.status = GameStatus::Failed;
        self.phase = Phase::End;
        self.sub_phase = None;
    }
}

/// Check that `roles` is exactly the standard deal in some order.
fn validate_distribution(roles: &[Role]) -> Result<(), StateError> {
    if roles.len() != PLAYER_COUNT {
        return Err(StateError::PlayerCount {
            expected: PLAYER_COUNT,
            found: roles.len(),
        });
    }
    for role in Role::ALL {
        let found = roles.iter().filter(|r| **r == role).count();
        if found != role.standard_count() {
            return Err(StateError::RoleCount {
                role,
                expected: role.standard_count(),
                found,
            });
        }
    }
    Ok(())
}
