//! Logical tick scheduler with individually cancellable timers
//!
//! The scheduler never runs callbacks itself. Owners drain due timers with
//! [`TickScheduler::pop_due`] and close the tick with [`TickScheduler::finish_tick`],
//! which keeps every timer handler on the owner's `&mut self` and lets a handler
//! cancel timers that would otherwise fire later in the same tick.

use std::collections::BTreeMap;

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone)]
struct Entry<K> {
    due: u64,
    period: Option<u64>,
    kind: K,
}

#[derive(Debug, Clone)]
pub struct TickScheduler<K> {
    now: u64,
    next_token: u64,
    entries: BTreeMap<TimerToken, Entry<K>>,
}

impl<K: Clone> TickScheduler<K> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_token: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Current tick
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Fire `kind` once, `delay` ticks from now (0 = later this tick)
    pub fn schedule_once(&mut self, delay: u64, kind: K) -> TimerToken {
        self.insert(delay, None, kind)
    }

    /// Fire `kind` after `delay` ticks and then every `period` ticks until cancelled
    pub fn schedule_repeating(&mut self, delay: u64, period: u64, kind: K) -> TimerToken {
        self.insert(delay, Some(period.max(1)), kind)
    }

    fn insert(&mut self, delay: u64, period: Option<u64>, kind: K) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.entries.insert(
            token,
            Entry {
                due: self.now.saturating_add(delay),
                period,
                kind,
            },
        );
        token
    }

    /// Cancel a timer. Returns false if it already fired (one-shot) or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        self.entries.remove(&token).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Number of live timers
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Release the earliest timer due at or before the current tick.
    ///
    /// Repeating timers are re-armed one period later; one-shot timers are removed.
    pub fn pop_due(&mut self) -> Option<(TimerToken, K)> {
        let (token, _) = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.due <= self.now)
            .min_by_key(|(token, entry)| (entry.due, **token))?;
        let token = *token;

        let entry = self.entries.get_mut(&token)?;
        let kind = entry.kind.clone();
        match entry.period {
            Some(period) => entry.due = self.now + period,
            None => {
                self.entries.remove(&token);
            }
        }
        Some((token, kind))
    }

    /// Close the current tick
    pub fn finish_tick(&mut self) {
        self.now += 1;
    }

    /// Drain every due timer and close the tick
    pub fn advance(&mut self) -> Vec<K> {
        let mut fired = Vec::new();
        while let Some((_, kind)) = self.pop_due() {
            fired.push(kind);
        }
        self.finish_tick();
        fired
    }
}

impl<K: Clone> Default for TickScheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}
