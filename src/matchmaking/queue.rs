//! Per-mode FIFO waiting list

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::game::{MatchMode, Participant, ParticipantId};

/// Participant in a matchmaking queue
#[derive(Debug, Clone)]
pub struct QueuedPlayer {
    pub participant: Participant,
    pub queued_at: Instant,
}

impl QueuedPlayer {
    pub fn new(participant: Participant) -> Self {
        Self {
            participant,
            queued_at: Instant::now(),
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.participant.id
    }

    /// How long this participant has been waiting
    pub fn wait_time(&self) -> Duration {
        self.queued_at.elapsed()
    }
}

/// The waiting list for one mode. Insertion order is priority.
#[derive(Debug)]
pub struct MatchmakingQueue {
    mode: MatchMode,
    queue: VecDeque<QueuedPlayer>,
}

impl MatchmakingQueue {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            queue: VecDeque::new(),
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Append a participant and return their 1-based position.
    /// Returns `None` if they are already queued.
    pub fn enqueue(&mut self, participant: Participant) -> Option<usize> {
        if self.contains(&participant.id) {
            return None;
        }
        self.queue.push_back(QueuedPlayer::new(participant));
        Some(self.queue.len())
    }

    /// Remove a participant by identity
    pub fn dequeue(&mut self, id: &ParticipantId) -> Option<QueuedPlayer> {
        let pos = self.position(id)?;
        self.queue.remove(pos)
    }

    /// Pop up to `count` participants from the head, oldest first
    pub fn take_front(&mut self, count: usize) -> Vec<QueuedPlayer> {
        let count = count.min(self.queue.len());
        self.queue.drain(..count).collect()
    }

    /// Put participants back at the head, keeping their original order
    pub fn restore_front(&mut self, players: Vec<QueuedPlayer>) {
        for player in players.into_iter().rev() {
            self.queue.push_front(player);
        }
    }

    /// Drop every participant matching `pred` and return them
    pub fn remove_where(&mut self, mut pred: impl FnMut(&QueuedPlayer) -> bool) -> Vec<QueuedPlayer> {
        let mut removed = Vec::new();
        self.queue.retain(|player| {
            if pred(player) {
                removed.push(player.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.queue.iter().any(|p| &p.participant.id == id)
    }

    /// 0-based index of a participant
    pub fn position(&self, id: &ParticipantId) -> Option<usize> {
        self.queue.iter().position(|p| &p.participant.id == id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Longest current wait
    pub fn oldest_wait(&self) -> Option<Duration> {
        self.queue.front().map(QueuedPlayer::wait_time)
    }

    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}
