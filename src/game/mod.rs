//! Match orchestration: state machine, play-area controller and session registry

pub mod events;
pub mod ledger;
pub mod r#match;
pub mod player;
pub mod registry;
pub mod scheduler;
pub mod zone;

pub use events::{MatchEvent, NoopHooks, ProgressionHooks, Standing, TracingHooks};
pub use ledger::{ParticipantLedger, ParticipantTotals};
pub use player::{GamePlayer, Participant, ParticipantId, PlayerState};
pub use r#match::{GameMatch, MatchId, MatchMode, MatchPhase, MatchState, MatchStatus};
pub use registry::SessionRegistry;
pub use scheduler::{TickScheduler, TimerToken};
pub use zone::{Zone, ZoneEvent};
