//! Session-wide progression totals, kept across matches

use dashmap::DashMap;
use serde::Serialize;

use super::player::ParticipantId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParticipantTotals {
    pub kills: u32,
    pub deaths: u32,
    pub games_played: u32,
    pub wins: u32,
}

/// Per-participant totals shared by every match
#[derive(Debug, Default)]
pub struct ParticipantLedger {
    totals: DashMap<ParticipantId, ParticipantTotals>,
}

impl ParticipantLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a kill and return the participant's new total
    pub fn record_kill(&self, id: ParticipantId) -> u32 {
        let mut entry = self.totals.entry(id).or_default();
        entry.kills += 1;
        entry.kills
    }

    pub fn record_death(&self, id: ParticipantId) {
        self.totals.entry(id).or_default().deaths += 1;
    }

    pub fn record_game(&self, id: ParticipantId) {
        self.totals.entry(id).or_default().games_played += 1;
    }

    pub fn record_win(&self, id: ParticipantId) {
        self.totals.entry(id).or_default().wins += 1;
    }

    pub fn totals(&self, id: &ParticipantId) -> ParticipantTotals {
        self.totals.get(id).map(|t| *t).unwrap_or_default()
    }

    /// Drop a participant's totals, e.g. on disconnect
    pub fn forget(&self, id: &ParticipantId) -> Option<ParticipantTotals> {
        self.totals.remove(id).map(|(_, totals)| totals)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}
