//! Time utilities for the logical tick loop

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Logical tick rate. Every timer in the orchestration core is expressed in these ticks.
pub const TICKS_PER_SECOND: u64 = 20;
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / TICKS_PER_SECOND;

/// Wall-clock length of one logical tick
pub fn tick_duration() -> Duration {
    Duration::from_micros(TICK_DURATION_MICROS)
}

/// Convert whole seconds to logical ticks
pub fn secs_to_ticks(secs: u64) -> u64 {
    secs.saturating_mul(TICKS_PER_SECOND)
}

/// Convert a tick count back to whole seconds (truncating)
pub fn ticks_to_secs(ticks: u64) -> u64 {
    ticks / TICKS_PER_SECOND
}
