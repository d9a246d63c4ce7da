//! Process-wide directory of active matches and participant mappings

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::app::GameContext;
use crate::arena::Arena;
use crate::util::time::{secs_to_ticks, tick_duration};

use super::player::{Participant, ParticipantId};
use super::r#match::{GameMatch, MatchId, MatchMode};
use super::scheduler::TickScheduler;

/// Registry of all active matches
pub struct SessionRegistry {
    ctx: GameContext,
    matches: DashMap<MatchId, Arc<GameMatch>>,
    participants: DashMap<ParticipantId, MatchId>,
    /// Ended matches waiting out the late-lookup window
    retirements: Mutex<TickScheduler<MatchId>>,
}

impl SessionRegistry {
    pub fn new(ctx: GameContext) -> Self {
        Self {
            ctx,
            matches: DashMap::new(),
            participants: DashMap::new(),
            retirements: Mutex::new(TickScheduler::new()),
        }
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    /// Allocate and register a match with a fresh id
    pub fn create_match(self: &Arc<Self>, arena: Arc<Arena>, mode: MatchMode) -> Arc<GameMatch> {
        let id = Uuid::new_v4();
        let game = Arc::new(GameMatch::new(
            id,
            arena,
            mode,
            self.ctx.clone(),
            Arc::downgrade(self),
        ));
        self.matches.insert(id, game.clone());

        info!(
            match_id = %id,
            arena = %game.arena().name,
            mode = ?mode,
            capacity = game.capacity(),
            "Match created"
        );
        game
    }

    /// Place a participant into a match and map them to it.
    ///
    /// Fails if the participant is already mapped or the match refuses the join.
    pub fn assign(&self, game: &GameMatch, participant: Participant) -> bool {
        let id = participant.id;
        match self.participants.entry(id) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => {
                slot.insert(game.id());
            }
        }

        if game.add_player(participant) {
            true
        } else {
            self.participants.remove_if(&id, |_, mapped| *mapped == game.id());
            false
        }
    }

    /// Detach the roster of a finished match and schedule its removal
    pub fn end_match(&self, match_id: MatchId, roster: &[ParticipantId]) {
        for id in roster {
            self.participants.remove_if(id, |_, mapped| *mapped == match_id);
        }

        if !self.matches.contains_key(&match_id) {
            return;
        }
        let delay = secs_to_ticks(self.ctx.settings.timers.retire_delay_secs);
        self.retirements.lock().schedule_once(delay, match_id);
        info!(match_id = %match_id, detached = roster.len(), "Match ended, retirement scheduled");
    }

    pub fn is_in_match(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn match_of(&self, id: &ParticipantId) -> Option<Arc<GameMatch>> {
        let match_id = *self.participants.get(id)?;
        self.get(&match_id)
    }

    pub fn get(&self, match_id: &MatchId) -> Option<Arc<GameMatch>> {
        self.matches.get(match_id).map(|m| m.value().clone())
    }

    pub fn matches(&self) -> Vec<Arc<GameMatch>> {
        self.matches.iter().map(|m| m.value().clone()).collect()
    }

    pub fn active_match_count(&self) -> usize {
        self.matches.len()
    }

    /// Participants currently mapped to a match
    pub fn total_players(&self) -> usize {
        self.participants.len()
    }

    /// Kills scored by a participant in their current match
    pub fn match_kills(&self, id: &ParticipantId) -> u32 {
        self.match_of(id).map(|game| game.kills_of(id)).unwrap_or(0)
    }

    /// Detach a participant (leave or disconnect) and remove them from their match
    pub fn remove_participant(&self, id: &ParticipantId) -> bool {
        let Some((_, match_id)) = self.participants.remove(id) else {
            return false;
        };
        if let Some(game) = self.get(&match_id) {
            game.remove_player(id);
        }
        true
    }

    /// Route an elimination to the victim's match
    pub fn report_elimination(&self, victim: &ParticipantId, killer: Option<ParticipantId>) -> bool {
        match self.match_of(victim) {
            Some(game) => game.eliminate_player(victim, killer),
            None => {
                debug!(participant_id = %victim, "Elimination for participant outside any match");
                false
            }
        }
    }

    /// Force-end every match and drop both tables. Used at shutdown.
    pub fn force_end_all(&self) {
        let active = self.matches();
        info!(count = active.len(), "Force-ending all matches");
        for game in active {
            game.force_end();
        }
        self.matches.clear();
        self.participants.clear();
        self.retirements.lock().cancel_all();
    }

    /// One logical tick: tick every match, then retire those whose window elapsed
    pub fn tick(&self) {
        for game in self.matches() {
            game.tick();
        }

        let due = self.retirements.lock().advance();
        for match_id in due {
            if self.matches.remove(&match_id).is_some() {
                info!(match_id = %match_id, "Match retired");
            }
        }
    }

    /// Drive [`SessionRegistry::tick`] at the server tick rate
    pub async fn run(self: Arc<Self>) {
        let mut ticker = interval(tick_duration());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.tick();
        }
    }
}
