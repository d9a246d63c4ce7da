//! Shared fixtures for integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use royale_server::app::GameContext;
use royale_server::arena::{Arena, ArenaProvider, Position};
use royale_server::config::GameSettings;
use royale_server::game::{GameMatch, Participant, ParticipantId, ProgressionHooks, SessionRegistry};
use royale_server::matchmaking::QueueManager;
use royale_server::util::time::TICKS_PER_SECOND;

/// A single progression callback as observed by [`RecordingHooks`]
#[derive(Debug, Clone, PartialEq)]
pub enum HookCall {
    Kill {
        participant: ParticipantId,
        total_kills: u32,
        match_kills: u32,
    },
    Win(ParticipantId),
    GameEnd(ParticipantId),
    DamageDealt(ParticipantId, f64),
    DamageTaken(ParticipantId, f64),
}

/// Hooks that remember every call in order
#[derive(Debug, Default)]
pub struct RecordingHooks {
    calls: Mutex<Vec<HookCall>>,
}

impl RecordingHooks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().clone()
    }

    pub fn wins(&self) -> Vec<ParticipantId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HookCall::Win(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn game_ends(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, HookCall::GameEnd(_)))
            .count()
    }

    pub fn kills(&self) -> Vec<(ParticipantId, u32, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HookCall::Kill {
                    participant,
                    total_kills,
                    match_kills,
                } => Some((participant, total_kills, match_kills)),
                _ => None,
            })
            .collect()
    }
}

impl ProgressionHooks for RecordingHooks {
    fn on_kill(&self, participant: &Participant, total_kills: u32, match_kills: u32) {
        self.calls.lock().push(HookCall::Kill {
            participant: participant.id,
            total_kills,
            match_kills,
        });
    }

    fn on_win(&self, participant: &Participant, _game: &GameMatch) {
        self.calls.lock().push(HookCall::Win(participant.id));
    }

    fn on_game_end(&self, participant: &Participant) {
        self.calls.lock().push(HookCall::GameEnd(participant.id));
    }

    fn on_damage_dealt(&self, participant: &Participant, amount: f64) {
        self.calls
            .lock()
            .push(HookCall::DamageDealt(participant.id, amount));
    }

    fn on_damage_taken(&self, participant: &Participant, amount: f64) {
        self.calls
            .lock()
            .push(HookCall::DamageTaken(participant.id, amount));
    }
}

/// Arena provider whose availability can be toggled mid-test
pub struct SwitchableArenas {
    arena: Arc<Arena>,
    available: AtomicBool,
}

impl SwitchableArenas {
    pub fn new(arena: Arena, available: bool) -> Arc<Self> {
        Arc::new(Self {
            arena: Arc::new(arena),
            available: AtomicBool::new(available),
        })
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl ArenaProvider for SwitchableArenas {
    fn valid_arena_exists(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn pick_random_arena(&self) -> Option<Arc<Arena>> {
        self.valid_arena_exists().then(|| self.arena.clone())
    }

    fn arenas(&self) -> Vec<Arc<Arena>> {
        vec![self.arena.clone()]
    }

    fn pick_arena_for(&self, min_players: usize) -> Option<Arc<Arena>> {
        self.pick_random_arena()
            .filter(|arena| arena.max_players >= min_players)
    }
}

/// Short timers so lifecycle tests run in a few hundred ticks
pub fn fast_settings() -> GameSettings {
    let mut settings = GameSettings::default();
    settings.modes.battle_royale.min_players = 2;
    settings.modes.battle_royale.max_players = 4;
    settings.modes.resurgence.min_players = 3;
    settings.modes.resurgence.max_players = 6;
    settings.timers.countdown_secs = 1;
    settings.timers.grace_period_secs = 1;
    settings.timers.cleanup_delay_secs = 1;
    settings.timers.retire_delay_secs = 1;
    settings.zone.show_border = false;
    settings
}

pub fn test_arena(name: &str) -> Arena {
    Arena::new(name)
        .with_center(Position::ORIGIN)
        .with_lobby(Position::new(0.0, 120.0, 0.0))
        .with_spawns(vec![
            Position::new(20.0, 0.0, 0.0),
            Position::new(-20.0, 0.0, 0.0),
            Position::new(0.0, 0.0, 20.0),
        ])
}

pub struct TestSystem {
    pub registry: Arc<SessionRegistry>,
    pub queue: Arc<QueueManager>,
    pub hooks: Arc<RecordingHooks>,
    pub context: GameContext,
}

pub fn system(settings: GameSettings, arenas: Arc<dyn ArenaProvider>) -> TestSystem {
    let hooks = RecordingHooks::new();
    let context = GameContext::new(settings, hooks.clone());
    let registry = Arc::new(SessionRegistry::new(context.clone()));
    let queue = Arc::new(QueueManager::new(registry.clone(), arenas));
    TestSystem {
        registry,
        queue,
        hooks,
        context,
    }
}

pub fn players(n: usize) -> Vec<Participant> {
    (0..n).map(|_| Participant::random()).collect()
}

pub fn tick_secs(registry: &SessionRegistry, secs: u64) {
    for _ in 0..secs * TICKS_PER_SECOND {
        registry.tick();
    }
}

/// Ticks from match creation until combat is enabled with [`fast_settings`]
pub const TICKS_TO_COMBAT: u64 = 2 * TICKS_PER_SECOND + 1;

pub fn tick_n(registry: &SessionRegistry, n: u64) {
    for _ in 0..n {
        registry.tick();
    }
}
