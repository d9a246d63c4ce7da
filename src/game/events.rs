//! Outbound match events and progression hooks

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::arena::Position;

use super::player::{Participant, ParticipantId};
use super::r#match::{GameMatch, MatchMode};

/// Final placement entry in a winner announcement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub participant_id: ParticipantId,
    pub name: String,
    pub kills: u32,
}

/// Everything a match tells the outside world. Fanned out over a broadcast channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    PlayerJoined {
        participant_id: ParticipantId,
        name: String,
        count: usize,
        capacity: usize,
    },
    PlayerLeft {
        participant_id: ParticipantId,
        name: String,
        count: usize,
    },
    Countdown {
        seconds_remaining: u64,
    },
    GameStarted {
        arena: String,
        mode: MatchMode,
    },
    SpawnAssigned {
        participant_id: ParticipantId,
        position: Position,
    },
    GracePeriodStarted {
        seconds: u64,
    },
    PvpEnabled,
    ZoneShrinking {
        stage: u32,
        target_radius: f64,
    },
    ZoneHalted {
        stage: u32,
        radius: f64,
    },
    FinalZone {
        radius: f64,
    },
    ZoneBorder {
        center: Position,
        radius: f64,
    },
    ZoneWarning {
        participant_id: ParticipantId,
        damage: f64,
    },
    Eliminated {
        victim: ParticipantId,
        killer: Option<ParticipantId>,
        remaining: usize,
    },
    WinnersAnnounced {
        mode: MatchMode,
        winners: Vec<Standing>,
    },
    ReturnToLobby {
        participant_id: ParticipantId,
        position: Position,
    },
    MatchEnded {
        match_id: Uuid,
    },
}

/// Progression callbacks invoked by matches. All methods default to no-ops.
///
/// Hooks run after the match has released its lock, so implementations may
/// query the match they are handed.
pub trait ProgressionHooks: Send + Sync {
    /// A participant scored a kill. `total_kills` spans every match this session.
    fn on_kill(&self, _participant: &Participant, _total_kills: u32, _match_kills: u32) {}

    fn on_win(&self, _participant: &Participant, _game: &GameMatch) {}

    /// Fired for every participant of a match that ended normally
    fn on_game_end(&self, _participant: &Participant) {}

    fn on_damage_dealt(&self, _participant: &Participant, _amount: f64) {}

    fn on_damage_taken(&self, _participant: &Participant, _amount: f64) {}
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl ProgressionHooks for NoopHooks {}

/// Hooks that log progression milestones
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHooks;

impl ProgressionHooks for TracingHooks {
    fn on_kill(&self, participant: &Participant, total_kills: u32, match_kills: u32) {
        info!(
            participant_id = %participant.id,
            total_kills,
            match_kills,
            "Kill recorded"
        );
    }

    fn on_win(&self, participant: &Participant, game: &GameMatch) {
        info!(
            participant_id = %participant.id,
            match_id = %game.id(),
            mode = game.mode().key(),
            "Win recorded"
        );
    }

    fn on_game_end(&self, participant: &Participant) {
        info!(participant_id = %participant.id, "Game completed");
    }
}
