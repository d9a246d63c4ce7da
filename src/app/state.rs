//! Application state shared across routes and background tasks

use std::sync::Arc;
use tracing::info;

use crate::arena::ArenaProvider;
use crate::config::{Config, GameSettings};
use crate::game::{
    NoopHooks, ParticipantId, ParticipantLedger, ProgressionHooks, SessionRegistry, TracingHooks,
};
use crate::matchmaking::QueueManager;
use crate::util::rate_limit::IngestLimiters;

/// What every match needs from the outside: settings, progression hooks and session totals
#[derive(Clone)]
pub struct GameContext {
    pub settings: Arc<GameSettings>,
    pub hooks: Arc<dyn ProgressionHooks>,
    pub ledger: Arc<ParticipantLedger>,
}

impl GameContext {
    pub fn new(settings: GameSettings, hooks: Arc<dyn ProgressionHooks>) -> Self {
        Self {
            settings: Arc::new(settings),
            hooks,
            ledger: Arc::new(ParticipantLedger::new()),
        }
    }

    /// Context with hooks that do nothing
    pub fn with_settings(settings: GameSettings) -> Self {
        Self::new(settings, Arc::new(NoopHooks))
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub context: GameContext,
    pub arenas: Arc<dyn ArenaProvider>,
    pub registry: Arc<SessionRegistry>,
    pub queue: Arc<QueueManager>,
    pub limiters: IngestLimiters,
}

impl AppState {
    pub fn new(config: Config, settings: GameSettings, arenas: Arc<dyn ArenaProvider>) -> Self {
        Self::with_context(config, GameContext::new(settings, Arc::new(TracingHooks)), arenas)
    }

    pub fn with_context(config: Config, context: GameContext, arenas: Arc<dyn ArenaProvider>) -> Self {
        // Initialize session registry
        let registry = Arc::new(SessionRegistry::new(context.clone()));

        // Initialize matchmaking (Arc for sharing across cloned AppState)
        let queue = Arc::new(QueueManager::new(registry.clone(), arenas.clone()));

        Self {
            config: Arc::new(config),
            context,
            arenas,
            registry,
            queue,
            limiters: IngestLimiters::new(),
        }
    }

    /// Drop every trace of a participant: queue slots, match membership and session totals
    pub async fn disconnect(&self, id: &ParticipantId) {
        let dequeued = self.queue.leave_all(id).await;
        let left_match = self.registry.remove_participant(id);
        self.context.ledger.forget(id);
        info!(participant_id = %id, dequeued, left_match, "Participant disconnected");
    }
}
