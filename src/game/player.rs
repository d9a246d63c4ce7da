//! Participants and their per-match records

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::arena::Position;

pub type ParticipantId = Uuid;

/// Stable identity of a connected participant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
}

impl Participant {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Participant with a generated id and a name derived from it
    pub fn random() -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            name: format!("Player_{}", &id.to_string()[..8]),
        }
    }
}

/// Per-match state of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Alive,
    Spectating,
}

/// A participant inside one match. Discarded at cleanup.
#[derive(Debug, Clone)]
pub struct GamePlayer {
    pub participant: Participant,
    pub state: PlayerState,
    pub kills: u32,
    pub deaths: u32,
    pub damage_dealt: f64,
    pub damage_taken: f64,
    /// Seconds survived since the match began; set on elimination or at match end
    pub survival_secs: u64,
    /// Last reported position, used by the zone damage tick
    pub position: Option<Position>,
}

impl GamePlayer {
    pub fn new(participant: Participant) -> Self {
        Self {
            participant,
            state: PlayerState::Alive,
            kills: 0,
            deaths: 0,
            damage_dealt: 0.0,
            damage_taken: 0.0,
            survival_secs: 0,
            position: None,
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.participant.id
    }

    pub fn name(&self) -> &str {
        &self.participant.name
    }
}
