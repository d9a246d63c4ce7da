//! Royale Server - match orchestration for zone-based battle royale sessions
//!
//! Participants queue per mode, matches are formed once a population threshold is met,
//! and each match runs its own countdown, grace period, shrinking zone and resolution.

pub mod app;
pub mod arena;
pub mod config;
pub mod game;
pub mod http;
pub mod matchmaking;
pub mod util;
