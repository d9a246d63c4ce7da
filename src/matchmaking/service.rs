//! Queue manager: per-mode queues and match formation

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::arena::ArenaProvider;
use crate::game::{GameMatch, MatchMode, Participant, ParticipantId, SessionRegistry};

use super::queue::MatchmakingQueue;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("participant is already in a match")]
    AlreadyInMatch,
    #[error("participant is already queued for {mode}")]
    AlreadyQueued { mode: MatchMode },
}

/// Per-mode queue summary for status endpoints
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub mode: MatchMode,
    pub size: usize,
    pub oldest_wait_ms: Option<u64>,
}

/// Matchmaking across every mode
pub struct QueueManager {
    queues: HashMap<MatchMode, Mutex<MatchmakingQueue>>,
    /// The single mode each waiting participant holds a claim on
    queued: DashMap<ParticipantId, MatchMode>,
    registry: Arc<SessionRegistry>,
    arenas: Arc<dyn ArenaProvider>,
}

impl QueueManager {
    pub fn new(registry: Arc<SessionRegistry>, arenas: Arc<dyn ArenaProvider>) -> Self {
        let queues = MatchMode::ALL
            .into_iter()
            .map(|mode| (mode, Mutex::new(MatchmakingQueue::new(mode))))
            .collect();
        Self {
            queues,
            queued: DashMap::new(),
            registry,
            arenas,
        }
    }

    fn queue(&self, mode: MatchMode) -> &Mutex<MatchmakingQueue> {
        // every mode gets a queue in `new`
        &self.queues[&mode]
    }

    fn release(&self, id: &ParticipantId, mode: MatchMode) {
        self.queued.remove_if(id, |_, claimed| *claimed == mode);
    }

    /// Join a mode's queue and run a start check.
    ///
    /// The claim in `queued` is taken before anything else, so two joins racing across
    /// modes cannot both succeed. Returns the 1-based queue position at the time of joining.
    pub async fn join(&self, participant: Participant, mode: MatchMode) -> Result<usize, QueueError> {
        let id = participant.id;
        match self.queued.entry(id) {
            Entry::Occupied(slot) => return Err(QueueError::AlreadyQueued { mode: *slot.get() }),
            Entry::Vacant(slot) => {
                slot.insert(mode);
            }
        }
        if self.registry.is_in_match(&id) {
            self.release(&id, mode);
            return Err(QueueError::AlreadyInMatch);
        }

        let position = {
            let mut queue = self.queue(mode).lock().await;
            let position = queue
                .enqueue(participant)
                .ok_or(QueueError::AlreadyQueued { mode })?;
            info!(
                participant_id = %id,
                mode = ?mode,
                queue_size = queue.len(),
                "Participant joined matchmaking queue"
            );
            position
        };

        self.try_start(mode).await;
        Ok(position)
    }

    pub async fn leave(&self, id: &ParticipantId, mode: MatchMode) -> bool {
        let mut queue = self.queue(mode).lock().await;
        let left = queue.dequeue(id).is_some();
        if left {
            self.release(id, mode);
            info!(participant_id = %id, mode = ?mode, "Participant left matchmaking queue");
        }
        left
    }

    /// Remove a participant from whichever queue they are in
    pub async fn leave_all(&self, id: &ParticipantId) -> bool {
        match self.queued_mode(id) {
            Some(mode) => self.leave(id, mode).await,
            None => false,
        }
    }

    /// Form a match if the mode's queue has reached its minimum.
    ///
    /// The queue lock is held for the whole attempt. A missing or invalid arena aborts
    /// the attempt and leaves the queue untouched. If fewer than the minimum could be
    /// placed, the match is torn down and the placed participants go back to the head.
    pub async fn try_start(&self, mode: MatchMode) -> Option<Arc<GameMatch>> {
        let mut queue = self.queue(mode).lock().await;
        let limits = *self.registry.context().settings.mode(mode);

        let stale = queue.remove_where(|queued| self.registry.is_in_match(&queued.id()));
        for queued in &stale {
            self.release(&queued.id(), mode);
            warn!(participant_id = %queued.id(), mode = ?mode, "Dropped queued participant already in a match");
        }
        if queue.len() < limits.min_players {
            return None;
        }

        if !self.arenas.valid_arena_exists() {
            warn!(mode = ?mode, queued = queue.len(), "No valid arena available, match start deferred");
            return None;
        }
        let Some(arena) = self.arenas.pick_arena_for(limits.min_players) else {
            warn!(
                mode = ?mode,
                min_players = limits.min_players,
                "No valid arena seats the mode minimum"
            );
            return None;
        };
        if !arena.is_valid() {
            warn!(mode = ?mode, arena = %arena.name, "Picked arena is not valid");
            return None;
        }
        let capacity = limits.max_players.min(arena.max_players);
        if capacity < limits.min_players {
            warn!(
                mode = ?mode,
                arena = %arena.name,
                arena_max = arena.max_players,
                min_players = limits.min_players,
                "Arena too small for mode minimum"
            );
            return None;
        }

        let game = self.registry.create_match(arena, mode);
        let mut placed = Vec::with_capacity(capacity);
        for queued in queue.take_front(capacity) {
            let id = queued.id();
            if self.registry.assign(&game, queued.participant.clone()) {
                placed.push(queued);
            } else {
                self.release(&id, mode);
                warn!(participant_id = %id, match_id = %game.id(), "Could not place queued participant");
            }
        }

        if placed.len() < limits.min_players {
            warn!(
                match_id = %game.id(),
                mode = ?mode,
                placed = placed.len(),
                min_players = limits.min_players,
                "Too few participants placed, returning them to the queue"
            );
            game.force_end();
            queue.restore_front(placed);
            return None;
        }
        for queued in &placed {
            self.release(&queued.id(), mode);
        }

        info!(
            match_id = %game.id(),
            mode = ?mode,
            placed = placed.len(),
            remaining = queue.len(),
            "Match formed from queue"
        );
        Some(game)
    }

    pub async fn queue_size(&self, mode: MatchMode) -> usize {
        self.queue(mode).lock().await.len()
    }

    pub async fn queue_stats(&self) -> Vec<QueueStats> {
        let mut stats = Vec::with_capacity(MatchMode::ALL.len());
        for mode in MatchMode::ALL {
            let queue = self.queue(mode).lock().await;
            stats.push(QueueStats {
                mode: queue.mode(),
                size: queue.len(),
                oldest_wait_ms: queue.oldest_wait().map(|wait| wait.as_millis() as u64),
            });
        }
        stats
    }

    /// The mode a participant is queued for, if any
    pub fn queued_mode(&self, id: &ParticipantId) -> Option<MatchMode> {
        self.queued.get(id).map(|mode| *mode)
    }

    /// 1-based position in whichever queue the participant is in
    pub async fn position(&self, id: &ParticipantId) -> Option<(MatchMode, usize)> {
        let mode = self.queued_mode(id)?;
        let pos = self.queue(mode).lock().await.position(id)?;
        Some((mode, pos + 1))
    }

    /// Periodic safety-net start check. Joins already trigger a check synchronously.
    pub async fn run(self: Arc<Self>) {
        let period = self.registry.context().settings.queue.recheck_interval_ms;
        let mut interval = tokio::time::interval(Duration::from_millis(period.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            for mode in MatchMode::ALL {
                self.try_start(mode).await;
            }
        }
    }

    /// Drop every queued participant
    pub async fn shutdown(&self) {
        let mut dropped = 0;
        for mode in MatchMode::ALL {
            dropped += self.queue(mode).lock().await.clear();
        }
        self.queued.clear();
        info!(dropped, "Matchmaking queues cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::GameContext;
    use crate::arena::{Arena, Position, StaticArenaProvider};
    use crate::config::GameSettings;

    fn arena() -> Arena {
        Arena::new("ridge")
            .with_center(Position::ORIGIN)
            .with_lobby(Position::ORIGIN)
            .with_spawns(vec![Position::ORIGIN])
    }

    fn manager(arenas: Vec<Arena>) -> (QueueManager, Arc<SessionRegistry>) {
        let mut settings = GameSettings::default();
        settings.modes.battle_royale.min_players = 2;
        settings.modes.battle_royale.max_players = 3;
        settings.modes.resurgence.min_players = 2;
        settings.modes.resurgence.max_players = 3;
        let registry = Arc::new(SessionRegistry::new(GameContext::with_settings(settings)));
        let provider = Arc::new(StaticArenaProvider::new(arenas));
        (QueueManager::new(registry.clone(), provider), registry)
    }

    #[tokio::test]
    async fn test_join_rejects_second_queue() {
        let (manager, _) = manager(vec![arena()]);
        let p = Participant::random();

        assert_eq!(manager.join(p.clone(), MatchMode::Resurgence).await, Ok(1));
        assert_eq!(
            manager.join(p.clone(), MatchMode::Resurgence).await,
            Err(QueueError::AlreadyQueued {
                mode: MatchMode::Resurgence
            })
        );
        assert_eq!(
            manager.join(p.clone(), MatchMode::BattleRoyale).await,
            Err(QueueError::AlreadyQueued {
                mode: MatchMode::Resurgence
            })
        );
        assert_eq!(manager.position(&p.id).await, Some((MatchMode::Resurgence, 1)));

        let stats = manager.queue_stats().await;
        let resurgence = stats
            .iter()
            .find(|s| s.mode == MatchMode::Resurgence)
            .unwrap();
        assert_eq!(resurgence.size, 1);
        assert!(resurgence.oldest_wait_ms.is_some());
    }

    #[tokio::test]
    async fn test_racing_joins_claim_a_single_mode() {
        let (manager, registry) = manager(vec![arena()]);
        let p = Participant::random();

        // the battle royale join stalls on its queue lock while the resurgence join runs
        let guard = manager.queue(MatchMode::BattleRoyale).lock().await;
        let (br, rs) = tokio::join!(
            manager.join(p.clone(), MatchMode::BattleRoyale),
            async {
                let rs = manager.join(p.clone(), MatchMode::Resurgence).await;
                drop(guard);
                rs
            }
        );
        assert_eq!(br.is_ok() as u8 + rs.is_ok() as u8, 1);

        let in_br = manager.queue(MatchMode::BattleRoyale).lock().await.contains(&p.id);
        let in_rs = manager.queue(MatchMode::Resurgence).lock().await.contains(&p.id);
        assert!(in_br ^ in_rs);

        manager.join(Participant::random(), MatchMode::BattleRoyale).await.unwrap();
        manager.join(Participant::random(), MatchMode::Resurgence).await.unwrap();

        let formed = registry.matches();
        assert_eq!(formed.len(), 1);
        assert_eq!(formed[0].participant_count(), 2);
        assert!(registry.is_in_match(&p.id));
        assert_eq!(manager.queued_mode(&p.id), None);
    }

    #[tokio::test]
    async fn test_participant_placed_elsewhere_leaves_queue() {
        let (manager, registry) = manager(vec![arena()]);
        let a = Participant::random();
        manager.join(a.clone(), MatchMode::BattleRoyale).await.unwrap();
        let other = registry.create_match(Arc::new(arena()), MatchMode::Resurgence);
        assert!(registry.assign(&other, a.clone()));

        let b = Participant::random();
        manager.join(b.clone(), MatchMode::BattleRoyale).await.unwrap();
        assert_eq!(registry.active_match_count(), 1);
        assert_eq!(manager.queue_size(MatchMode::BattleRoyale).await, 1);
        assert_eq!(manager.queued_mode(&a.id), None);

        let c = Participant::random();
        manager.join(c.clone(), MatchMode::BattleRoyale).await.unwrap();
        let formed = registry.match_of(&b.id).unwrap();
        assert_eq!(formed.participant_ids(), vec![b.id, c.id]);
    }

    #[tokio::test]
    async fn test_small_arena_is_skipped_for_one_that_fits() {
        let (manager, registry) = manager(vec![
            arena().with_max_players(1),
            Arena::new("plateau")
                .with_center(Position::ORIGIN)
                .with_lobby(Position::ORIGIN)
                .with_spawns(vec![Position::ORIGIN]),
        ]);
        let a = Participant::random();
        manager.join(a.clone(), MatchMode::BattleRoyale).await.unwrap();
        manager.join(Participant::random(), MatchMode::BattleRoyale).await.unwrap();

        let formed = registry.match_of(&a.id).unwrap();
        assert_eq!(formed.arena().name, "plateau");
        assert_eq!(formed.participant_count(), 2);
    }

    #[tokio::test]
    async fn test_join_rejects_participant_in_match() {
        let (manager, registry) = manager(vec![arena()]);
        let a = Participant::random();
        let b = Participant::random();
        manager.join(a.clone(), MatchMode::BattleRoyale).await.unwrap();
        manager.join(b, MatchMode::BattleRoyale).await.unwrap();
        assert!(registry.is_in_match(&a.id));

        assert_eq!(
            manager.join(a, MatchMode::Resurgence).await,
            Err(QueueError::AlreadyInMatch)
        );
    }

    #[tokio::test]
    async fn test_missing_arena_preserves_queue() {
        let (manager, registry) = manager(vec![Arena::new("unfinished")]);
        for _ in 0..3 {
            manager
                .join(Participant::random(), MatchMode::BattleRoyale)
                .await
                .unwrap();
        }
        assert_eq!(registry.active_match_count(), 0);
        assert_eq!(manager.queue_size(MatchMode::BattleRoyale).await, 3);
        assert!(manager.try_start(MatchMode::BattleRoyale).await.is_none());
    }

    #[tokio::test]
    async fn test_arena_below_minimum_defers_start() {
        let (manager, registry) = manager(vec![arena().with_max_players(1)]);
        manager.join(Participant::random(), MatchMode::BattleRoyale).await.unwrap();
        manager.join(Participant::random(), MatchMode::BattleRoyale).await.unwrap();
        assert_eq!(registry.active_match_count(), 0);
        assert_eq!(manager.queue_size(MatchMode::BattleRoyale).await, 2);
    }

    #[tokio::test]
    async fn test_leave_and_shutdown() {
        let (manager, _) = manager(vec![arena()]);
        let p = Participant::random();
        manager.join(p.clone(), MatchMode::Resurgence).await.unwrap();

        assert!(!manager.leave(&p.id, MatchMode::BattleRoyale).await);
        assert!(manager.leave_all(&p.id).await);
        assert!(!manager.leave_all(&p.id).await);

        manager.join(Participant::random(), MatchMode::Resurgence).await.unwrap();
        manager.shutdown().await;
        assert_eq!(manager.queue_size(MatchMode::Resurgence).await, 0);
    }
}
