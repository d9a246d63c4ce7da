//! Application context

pub mod state;

pub use state::{AppState, GameContext};
