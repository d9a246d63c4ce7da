//! Match state machine and per-match tick
//!
//! A match owns its participant sets, kill tally, timers and zone behind one lock.
//! Mutating methods collect side effects while locked and dispatch them (broadcast
//! events, progression hooks, registry retirement) after the lock is released.

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::GameContext;
use crate::arena::{Arena, Position};
use crate::util::time::{secs_to_ticks, ticks_to_secs, unix_millis, TICKS_PER_SECOND};

use super::events::{MatchEvent, Standing};
use super::player::{GamePlayer, Participant, ParticipantId, PlayerState};
use super::registry::SessionRegistry;
use super::scheduler::{TickScheduler, TimerToken};
use super::zone::{Zone, ZoneEvent};

pub type MatchId = Uuid;

/// Number of placements announced in top-N mode
const TOP_N: usize = 3;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Match mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Last participant standing wins
    BattleRoyale,
    /// Top three by kills
    Resurgence,
}

impl MatchMode {
    pub const ALL: [MatchMode; 2] = [MatchMode::BattleRoyale, MatchMode::Resurgence];

    /// Settings and wire key
    pub fn key(self) -> &'static str {
        match self {
            MatchMode::BattleRoyale => "battle_royale",
            MatchMode::Resurgence => "resurgence",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MatchMode::BattleRoyale => "Battle Royale",
            MatchMode::Resurgence => "Resurgence",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.key() == key)
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lifecycle state. Moves forward only, except force-end which jumps to `Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    Waiting,
    Starting,
    Active,
    Ending,
    Ended,
}

/// Sub-phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    PreGame,
    /// Combat damage suppressed
    GracePeriod,
    ActiveCombat,
    /// Zone has reached its final radius
    FinalZone,
    PostGame,
}

/// Read-only snapshot for status surfaces
#[derive(Debug, Clone, Serialize)]
pub struct MatchStatus {
    pub id: MatchId,
    pub arena: String,
    pub mode: MatchMode,
    pub state: MatchState,
    pub phase: MatchPhase,
    pub capacity: usize,
    pub participants: usize,
    pub alive: usize,
    pub spectators: usize,
    pub countdown: Option<u64>,
    pub pvp_enabled: bool,
    pub zone_center: Option<Position>,
    pub zone_radius: Option<f64>,
    pub zone_target_radius: Option<f64>,
    pub zone_stage: u32,
    pub kills: Vec<Standing>,
    pub winners: Vec<Standing>,
    pub started_at: Option<u64>,
    pub ended_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchTimer {
    Countdown,
    GraceExpired,
    Cleanup,
}

/// Side effects gathered under the lock, applied in order once it is released
enum Effect {
    Event(MatchEvent),
    Kill {
        participant: Participant,
        match_kills: u32,
    },
    Death(ParticipantId),
    Win(Participant),
    GameEnd(Participant),
    DamageDealt(Participant, f64),
    DamageTaken(Participant, f64),
    Retire(Vec<ParticipantId>),
}

struct MatchInner {
    state: MatchState,
    phase: MatchPhase,
    players: HashMap<ParticipantId, GamePlayer>,
    /// Current participants in join order
    join_order: Vec<ParticipantId>,
    alive: HashSet<ParticipantId>,
    spectators: HashSet<ParticipantId>,
    kills: HashMap<ParticipantId, u32>,
    zone: Option<Zone>,
    timers: TickScheduler<MatchTimer>,
    countdown: u64,
    countdown_task: Option<TimerToken>,
    grace_task: Option<TimerToken>,
    cleanup_task: Option<TimerToken>,
    pvp_enabled: bool,
    began_at_tick: Option<u64>,
    started_at: Option<u64>,
    ended_at: Option<u64>,
    winners: Vec<Standing>,
    rng: ChaCha8Rng,
}

impl MatchInner {
    fn standing(&self, id: &ParticipantId) -> Option<Standing> {
        self.players.get(id).map(|player| Standing {
            participant_id: *id,
            name: player.name().to_string(),
            kills: self.kills.get(id).copied().unwrap_or(0),
        })
    }

    fn participant(&self, id: &ParticipantId) -> Option<Participant> {
        self.players.get(id).map(|player| player.participant.clone())
    }

    fn ids_in_order(&self, set: &HashSet<ParticipantId>) -> Vec<ParticipantId> {
        self.join_order
            .iter()
            .filter(|id| set.contains(*id))
            .copied()
            .collect()
    }

    fn survival_secs(&self) -> u64 {
        self.began_at_tick
            .map(|began| ticks_to_secs(self.timers.now().saturating_sub(began)))
            .unwrap_or(0)
    }
}

/// One played session, from queue pop to retirement
pub struct GameMatch {
    id: MatchId,
    arena: Arc<Arena>,
    mode: MatchMode,
    capacity: usize,
    min_players: usize,
    ctx: GameContext,
    registry: Weak<SessionRegistry>,
    events: broadcast::Sender<MatchEvent>,
    inner: Mutex<MatchInner>,
}

impl GameMatch {
    pub fn new(
        id: MatchId,
        arena: Arc<Arena>,
        mode: MatchMode,
        ctx: GameContext,
        registry: Weak<SessionRegistry>,
    ) -> Self {
        Self::with_seed(id, arena, mode, ctx, registry, rand::random())
    }

    /// Create a match whose spawn shuffle is driven by `seed`
    pub fn with_seed(
        id: MatchId,
        arena: Arc<Arena>,
        mode: MatchMode,
        ctx: GameContext,
        registry: Weak<SessionRegistry>,
        seed: u64,
    ) -> Self {
        let limits = *ctx.settings.mode(mode);
        let capacity = limits.max_players.min(arena.max_players);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            id,
            arena,
            mode,
            capacity,
            min_players: limits.min_players.min(capacity).max(1),
            ctx,
            registry,
            events,
            inner: Mutex::new(MatchInner {
                state: MatchState::Waiting,
                phase: MatchPhase::PreGame,
                players: HashMap::new(),
                join_order: Vec::new(),
                alive: HashSet::new(),
                spectators: HashSet::new(),
                kills: HashMap::new(),
                zone: None,
                timers: TickScheduler::new(),
                countdown: 0,
                countdown_task: None,
                grace_task: None,
                cleanup_task: None,
                pvp_enabled: false,
                began_at_tick: None,
                started_at: None,
                ended_at: None,
                winners: Vec::new(),
                rng: ChaCha8Rng::seed_from_u64(seed),
            }),
        }
    }

    /// Add a participant. Accepted while waiting or counting down, up to capacity.
    pub fn add_player(&self, participant: Participant) -> bool {
        let mut effects = Vec::new();
        let added = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            if !matches!(inner.state, MatchState::Waiting | MatchState::Starting) {
                debug!(match_id = %self.id, participant_id = %participant.id, state = ?inner.state, "Join rejected, match already started");
                false
            } else if inner.players.contains_key(&participant.id) {
                false
            } else if inner.players.len() >= self.capacity {
                warn!(match_id = %self.id, participant_id = %participant.id, capacity = self.capacity, "Match is full");
                false
            } else {
                let id = participant.id;
                effects.push(Effect::Event(MatchEvent::PlayerJoined {
                    participant_id: id,
                    name: participant.name.clone(),
                    count: inner.players.len() + 1,
                    capacity: self.capacity,
                }));
                inner.players.insert(id, GamePlayer::new(participant));
                inner.join_order.push(id);

                info!(
                    match_id = %self.id,
                    participant_id = %id,
                    player_count = inner.players.len(),
                    "Player joined match"
                );

                if inner.state == MatchState::Waiting && inner.players.len() >= self.min_players {
                    self.begin_countdown(inner);
                }
                true
            }
        };
        self.dispatch(effects);
        added
    }

    /// Remove a participant (leave or disconnect). Stale ids are ignored.
    pub fn remove_player(&self, id: &ParticipantId) -> bool {
        let mut effects = Vec::new();
        let removed = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            if inner.state == MatchState::Ended {
                false
            } else if let Some(player) = inner.players.remove(id) {
                inner.join_order.retain(|other| other != id);
                let was_alive = inner.alive.remove(id);
                inner.spectators.remove(id);

                effects.push(Effect::Event(MatchEvent::PlayerLeft {
                    participant_id: *id,
                    name: player.name().to_string(),
                    count: inner.players.len(),
                }));
                info!(match_id = %self.id, participant_id = %id, was_alive, "Player left match");

                if was_alive {
                    self.check_win_condition(inner, &mut effects);
                }
                true
            } else {
                false
            }
        };
        self.dispatch(effects);
        removed
    }

    /// Advance one logical tick: fire due match timers, then tick the zone.
    pub fn tick(&self) {
        let mut effects = Vec::new();
        {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            while let Some((_, timer)) = inner.timers.pop_due() {
                match timer {
                    MatchTimer::Countdown => self.on_countdown(inner, &mut effects),
                    MatchTimer::GraceExpired => self.on_grace_expired(inner, &mut effects),
                    MatchTimer::Cleanup => self.cleanup(inner, &mut effects),
                }
            }
            inner.timers.finish_tick();

            if inner.state == MatchState::Active {
                let positions: Vec<(ParticipantId, Position)> = inner
                    .alive
                    .iter()
                    .filter_map(|id| {
                        let position = inner.players.get(id)?.position?;
                        Some((*id, position))
                    })
                    .collect();

                let zone_events = match inner.zone.as_mut() {
                    Some(zone) => zone.tick(&positions),
                    None => Vec::new(),
                };
                for event in zone_events {
                    self.apply_zone_event(inner, event, &mut effects);
                }
            }
        }
        self.dispatch(effects);
    }

    /// Move `victim` from alive to spectator and credit `killer`.
    ///
    /// Returns false for stale or out-of-phase reports.
    pub fn eliminate_player(&self, victim: &ParticipantId, killer: Option<ParticipantId>) -> bool {
        let mut effects = Vec::new();
        let eliminated = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            if inner.state != MatchState::Active {
                debug!(match_id = %self.id, participant_id = %victim, state = ?inner.state, "Elimination outside active play ignored");
                false
            } else if !inner.alive.remove(victim) {
                false
            } else {
                inner.spectators.insert(*victim);
                let survived = inner.survival_secs();
                if let Some(player) = inner.players.get_mut(victim) {
                    player.state = PlayerState::Spectating;
                    player.deaths += 1;
                    player.survival_secs = survived;
                }
                effects.push(Effect::Death(*victim));

                let credited =
                    killer.filter(|k| k != victim && inner.players.contains_key(k));
                if let Some(killer_id) = credited {
                    let tally = {
                        let count = inner.kills.entry(killer_id).or_insert(0);
                        *count += 1;
                        *count
                    };
                    if let Some(player) = inner.players.get_mut(&killer_id) {
                        player.kills = tally;
                        effects.push(Effect::Kill {
                            participant: player.participant.clone(),
                            match_kills: tally,
                        });
                    }
                }

                let remaining = inner.alive.len();
                effects.push(Effect::Event(MatchEvent::Eliminated {
                    victim: *victim,
                    killer: credited,
                    remaining,
                }));
                info!(
                    match_id = %self.id,
                    participant_id = %victim,
                    killer = ?credited,
                    remaining,
                    "Player eliminated"
                );

                self.check_win_condition(inner, &mut effects);
                true
            }
        };
        self.dispatch(effects);
        eliminated
    }

    /// Record participant-versus-participant damage. Suppressed outside combat phases.
    pub fn record_damage(&self, attacker: &ParticipantId, victim: &ParticipantId, amount: f64) -> bool {
        let mut effects = Vec::new();
        let accepted = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            let in_combat = inner.state == MatchState::Active
                && matches!(inner.phase, MatchPhase::ActiveCombat | MatchPhase::FinalZone);
            let valid = amount.is_finite()
                && amount > 0.0
                && attacker != victim
                && inner.alive.contains(attacker)
                && inner.alive.contains(victim);

            if !(in_combat && valid) {
                debug!(match_id = %self.id, attacker = %attacker, victim = %victim, phase = ?inner.phase, "Damage suppressed");
                false
            } else {
                if let Some(player) = inner.players.get_mut(attacker) {
                    player.damage_dealt += amount;
                    effects.push(Effect::DamageDealt(player.participant.clone(), amount));
                }
                if let Some(player) = inner.players.get_mut(victim) {
                    player.damage_taken += amount;
                    effects.push(Effect::DamageTaken(player.participant.clone(), amount));
                }
                true
            }
        };
        self.dispatch(effects);
        accepted
    }

    /// Record the last known position of a participant, used by the zone damage tick
    pub fn update_position(&self, id: &ParticipantId, position: Position) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == MatchState::Ended {
            return false;
        }
        match inner.players.get_mut(id) {
            Some(player) => {
                player.position = Some(position);
                true
            }
            None => false,
        }
    }

    /// Transition to ENDING. Only the first call has any effect.
    pub fn end(&self) -> bool {
        let mut effects = Vec::new();
        let ended = {
            let mut guard = self.inner.lock();
            self.end_locked(&mut guard, &mut effects)
        };
        self.dispatch(effects);
        ended
    }

    /// Skip straight to cleanup without announcing or rewarding
    pub fn force_end(&self) -> bool {
        let mut effects = Vec::new();
        let forced = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.state == MatchState::Ended {
                false
            } else {
                warn!(match_id = %self.id, state = ?inner.state, "Force-ending match");
                self.cleanup(inner, &mut effects);
                true
            }
        };
        self.dispatch(effects);
        forced
    }

    fn begin_countdown(&self, inner: &mut MatchInner) {
        inner.state = MatchState::Starting;
        inner.countdown = self.ctx.settings.timers.countdown_secs;
        inner.countdown_task = Some(inner.timers.schedule_repeating(
            0,
            TICKS_PER_SECOND,
            MatchTimer::Countdown,
        ));
        info!(
            match_id = %self.id,
            seconds = inner.countdown,
            "Countdown started"
        );
    }

    fn on_countdown(&self, inner: &mut MatchInner, effects: &mut Vec<Effect>) {
        if inner.countdown == 0 {
            if let Some(task) = inner.countdown_task.take() {
                inner.timers.cancel(task);
            }
            self.begin(inner, effects);
            return;
        }

        if inner.countdown <= 5 || inner.countdown % 10 == 0 {
            effects.push(Effect::Event(MatchEvent::Countdown {
                seconds_remaining: inner.countdown,
            }));
        }
        inner.countdown -= 1;
    }

    fn begin(&self, inner: &mut MatchInner, effects: &mut Vec<Effect>) {
        if inner.state != MatchState::Starting {
            return;
        }

        inner.state = MatchState::Active;
        inner.phase = MatchPhase::GracePeriod;
        inner.pvp_enabled = false;
        inner.began_at_tick = Some(inner.timers.now());
        inner.started_at = Some(unix_millis());

        let center = self.arena.center.unwrap_or(Position::ORIGIN);
        inner.zone = Some(Zone::new(center, self.ctx.settings.zone.clone()));

        effects.push(Effect::Event(MatchEvent::GameStarted {
            arena: self.arena.display_name().to_string(),
            mode: self.mode,
        }));

        let mut order = inner.join_order.clone();
        order.shuffle(&mut inner.rng);

        let spawns = &self.arena.spawns;
        if spawns.is_empty() {
            warn!(match_id = %self.id, arena = %self.arena.name, "Arena has no spawn points");
        }

        for (i, id) in order.iter().enumerate() {
            inner.spectators.remove(id);
            inner.alive.insert(*id);
            let spawn = (!spawns.is_empty()).then(|| spawns[i % spawns.len()]);
            if let Some(player) = inner.players.get_mut(id) {
                player.state = PlayerState::Alive;
                if let Some(position) = spawn {
                    player.position = Some(position);
                    effects.push(Effect::Event(MatchEvent::SpawnAssigned {
                        participant_id: *id,
                        position,
                    }));
                }
            }
        }

        let grace = self.ctx.settings.timers.grace_period_secs;
        inner.grace_task = Some(
            inner
                .timers
                .schedule_once(secs_to_ticks(grace), MatchTimer::GraceExpired),
        );
        effects.push(Effect::Event(MatchEvent::GracePeriodStarted { seconds: grace }));

        info!(
            match_id = %self.id,
            arena = %self.arena.name,
            mode = ?self.mode,
            players = inner.alive.len(),
            "Match began"
        );

        self.check_win_condition(inner, effects);
    }

    fn on_grace_expired(&self, inner: &mut MatchInner, effects: &mut Vec<Effect>) {
        inner.grace_task = None;
        if inner.state != MatchState::Active {
            return;
        }

        inner.phase = MatchPhase::ActiveCombat;
        inner.pvp_enabled = true;
        effects.push(Effect::Event(MatchEvent::PvpEnabled));
        info!(match_id = %self.id, "Grace period over, combat enabled");

        let started = inner.zone.as_mut().and_then(Zone::start_shrinking);
        if let Some(event) = started {
            self.apply_zone_event(inner, event, effects);
        }

        let final_radius = inner
            .zone
            .as_ref()
            .filter(|zone| zone.is_final())
            .map(Zone::current_radius);
        if let Some(radius) = final_radius {
            self.apply_zone_event(inner, ZoneEvent::FinalZoneReached { radius }, effects);
        }
    }

    fn apply_zone_event(&self, inner: &mut MatchInner, event: ZoneEvent, effects: &mut Vec<Effect>) {
        match event {
            ZoneEvent::ShrinkStarted {
                stage,
                target_radius,
            } => {
                info!(match_id = %self.id, stage, target_radius, "Zone shrinking");
                effects.push(Effect::Event(MatchEvent::ZoneShrinking {
                    stage,
                    target_radius,
                }));
            }
            ZoneEvent::StageComplete { stage, radius } => {
                debug!(match_id = %self.id, stage, radius, "Zone stage complete");
                effects.push(Effect::Event(MatchEvent::ZoneHalted { stage, radius }));
            }
            ZoneEvent::FinalZoneReached { radius } => {
                if inner.phase == MatchPhase::ActiveCombat {
                    inner.phase = MatchPhase::FinalZone;
                    info!(match_id = %self.id, radius, "Final zone reached");
                    effects.push(Effect::Event(MatchEvent::FinalZone { radius }));
                }
            }
            ZoneEvent::Damage {
                participant_id,
                amount,
            } => {
                if let Some(player) = inner.players.get_mut(&participant_id) {
                    player.damage_taken += amount;
                    effects.push(Effect::Event(MatchEvent::ZoneWarning {
                        participant_id,
                        damage: amount,
                    }));
                }
            }
            ZoneEvent::Border { center, radius } => {
                effects.push(Effect::Event(MatchEvent::ZoneBorder { center, radius }));
            }
        }
    }

    fn check_win_condition(&self, inner: &mut MatchInner, effects: &mut Vec<Effect>) {
        // Both modes terminate on the same alive-count threshold
        if inner.state == MatchState::Active && inner.alive.len() <= 1 {
            self.end_locked(inner, effects);
        }
    }

    fn end_locked(&self, inner: &mut MatchInner, effects: &mut Vec<Effect>) -> bool {
        if matches!(inner.state, MatchState::Ending | MatchState::Ended) {
            return false;
        }

        inner.state = MatchState::Ending;
        inner.phase = MatchPhase::PostGame;
        inner.pvp_enabled = false;
        inner.ended_at = Some(unix_millis());
        self.cancel_timers(inner);

        let survived = inner.survival_secs();
        for id in inner.alive.iter() {
            if let Some(player) = inner.players.get_mut(id) {
                player.survival_secs = survived;
            }
        }

        let winners = self.determine_winners(inner);
        inner.winners = winners.clone();
        info!(
            match_id = %self.id,
            mode = ?self.mode,
            winners = ?winners.iter().map(|w| w.participant_id).collect::<Vec<_>>(),
            "Match ending"
        );
        effects.push(Effect::Event(MatchEvent::WinnersAnnounced {
            mode: self.mode,
            winners: winners.clone(),
        }));

        if self.ctx.settings.rewards.enabled {
            for winner in &winners {
                if let Some(participant) = inner.participant(&winner.participant_id) {
                    effects.push(Effect::Win(participant));
                }
            }
        }
        for id in &inner.join_order {
            if let Some(participant) = inner.participant(id) {
                effects.push(Effect::GameEnd(participant));
            }
        }

        let delay = secs_to_ticks(self.ctx.settings.timers.cleanup_delay_secs);
        inner.cleanup_task = Some(inner.timers.schedule_once(delay, MatchTimer::Cleanup));
        true
    }

    fn determine_winners(&self, inner: &MatchInner) -> Vec<Standing> {
        match self.mode {
            MatchMode::BattleRoyale => inner
                .ids_in_order(&inner.alive)
                .iter()
                .filter_map(|id| inner.standing(id))
                .collect(),
            MatchMode::Resurgence => {
                // Every participant ranks, zero kills included. Stable sort keeps join
                // order among equal kill counts.
                let mut ranked: Vec<Standing> = inner
                    .join_order
                    .iter()
                    .filter_map(|id| inner.standing(id))
                    .collect();
                ranked.sort_by(|a, b| b.kills.cmp(&a.kills));
                ranked.truncate(TOP_N);
                ranked
            }
        }
    }

    fn cancel_timers(&self, inner: &mut MatchInner) {
        let owned = [
            inner.countdown_task.take(),
            inner.grace_task.take(),
            inner.cleanup_task.take(),
        ];
        for task in owned.into_iter().flatten() {
            inner.timers.cancel(task);
        }
        debug_assert_eq!(inner.timers.pending(), 0);
        if let Some(zone) = inner.zone.as_mut() {
            zone.stop_shrinking();
        }
    }

    fn cleanup(&self, inner: &mut MatchInner, effects: &mut Vec<Effect>) {
        self.cancel_timers(inner);
        inner.state = MatchState::Ended;
        inner.phase = MatchPhase::PostGame;
        inner.pvp_enabled = false;
        inner.ended_at.get_or_insert_with(unix_millis);

        match self.arena.lobby {
            Some(lobby) => {
                for id in &inner.join_order {
                    effects.push(Effect::Event(MatchEvent::ReturnToLobby {
                        participant_id: *id,
                        position: lobby,
                    }));
                }
            }
            None => {
                warn!(match_id = %self.id, arena = %self.arena.name, "Arena has no lobby point, participants not returned");
            }
        }

        let roster = std::mem::take(&mut inner.join_order);
        inner.players.clear();
        inner.alive.clear();
        inner.spectators.clear();
        inner.kills.clear();

        effects.push(Effect::Event(MatchEvent::MatchEnded { match_id: self.id }));
        effects.push(Effect::Retire(roster));
        info!(match_id = %self.id, "Match cleaned up");
    }

    fn dispatch(&self, effects: Vec<Effect>) {
        let ctx = &self.ctx;
        for effect in effects {
            match effect {
                Effect::Event(event) => {
                    let _ = self.events.send(event);
                }
                Effect::Kill {
                    participant,
                    match_kills,
                } => {
                    let total = ctx.ledger.record_kill(participant.id);
                    ctx.hooks.on_kill(&participant, total, match_kills);
                }
                Effect::Death(id) => ctx.ledger.record_death(id),
                Effect::Win(participant) => {
                    ctx.ledger.record_win(participant.id);
                    ctx.hooks.on_win(&participant, self);
                }
                Effect::GameEnd(participant) => {
                    ctx.ledger.record_game(participant.id);
                    ctx.hooks.on_game_end(&participant);
                }
                Effect::DamageDealt(participant, amount) => {
                    ctx.hooks.on_damage_dealt(&participant, amount)
                }
                Effect::DamageTaken(participant, amount) => {
                    ctx.hooks.on_damage_taken(&participant, amount)
                }
                Effect::Retire(roster) => match self.registry.upgrade() {
                    Some(registry) => registry.end_match(self.id, &roster),
                    None => debug!(match_id = %self.id, "No registry to retire match from"),
                },
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.events.subscribe()
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn arena(&self) -> &Arc<Arena> {
        &self.arena
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state(&self) -> MatchState {
        self.inner.lock().state
    }

    pub fn phase(&self) -> MatchPhase {
        self.inner.lock().phase
    }

    pub fn pvp_enabled(&self) -> bool {
        self.inner.lock().pvp_enabled
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.inner.lock().players.contains_key(id)
    }

    pub fn is_alive(&self, id: &ParticipantId) -> bool {
        self.inner.lock().alive.contains(id)
    }

    pub fn is_spectator(&self, id: &ParticipantId) -> bool {
        self.inner.lock().spectators.contains(id)
    }

    pub fn participant_count(&self) -> usize {
        self.inner.lock().players.len()
    }

    pub fn alive_count(&self) -> usize {
        self.inner.lock().alive.len()
    }

    pub fn spectator_count(&self) -> usize {
        self.inner.lock().spectators.len()
    }

    /// Current participants in join order
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.inner.lock().join_order.clone()
    }

    pub fn alive_ids(&self) -> Vec<ParticipantId> {
        let inner = self.inner.lock();
        inner.ids_in_order(&inner.alive)
    }

    pub fn spectator_ids(&self) -> Vec<ParticipantId> {
        let inner = self.inner.lock();
        inner.ids_in_order(&inner.spectators)
    }

    pub fn kills_of(&self, id: &ParticipantId) -> u32 {
        self.inner.lock().kills.get(id).copied().unwrap_or(0)
    }

    pub fn player(&self, id: &ParticipantId) -> Option<GamePlayer> {
        self.inner.lock().players.get(id).cloned()
    }

    pub fn zone_radius(&self) -> Option<f64> {
        self.inner.lock().zone.as_ref().map(Zone::current_radius)
    }

    /// Winners computed when the match entered ENDING
    pub fn winners(&self) -> Vec<Standing> {
        self.inner.lock().winners.clone()
    }

    pub fn status(&self) -> MatchStatus {
        let inner = self.inner.lock();
        let mut kills: Vec<Standing> = inner
            .join_order
            .iter()
            .filter_map(|id| inner.standing(id))
            .filter(|standing| standing.kills > 0)
            .collect();
        kills.sort_by(|a, b| b.kills.cmp(&a.kills));

        MatchStatus {
            id: self.id,
            arena: self.arena.name.clone(),
            mode: self.mode,
            state: inner.state,
            phase: inner.phase,
            capacity: self.capacity,
            participants: inner.players.len(),
            alive: inner.alive.len(),
            spectators: inner.spectators.len(),
            countdown: (inner.state == MatchState::Starting).then_some(inner.countdown),
            pvp_enabled: inner.pvp_enabled,
            zone_center: inner.zone.as_ref().map(Zone::center),
            zone_radius: inner.zone.as_ref().map(Zone::current_radius),
            zone_target_radius: inner.zone.as_ref().map(Zone::target_radius),
            zone_stage: inner.zone.as_ref().map(Zone::stage).unwrap_or(0),
            kills,
            winners: inner.winners.clone(),
            started_at: inner.started_at,
            ended_at: inner.ended_at,
        }
    }
}
