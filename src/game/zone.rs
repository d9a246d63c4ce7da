//! Shrinking play-area controller for one match
//!
//! The zone shrinks in stages. Each stage targets `max(current * shrink_factor, final_radius)`
//! and animates toward it at `shrink_rate` units per second. Once a stage lands, the next one
//! is scheduled after `shrink_interval_secs` unless the final radius has been reached.
//! Out-of-bounds damage runs on its own fixed interval regardless of stage animation.

use crate::arena::Position;
use crate::config::ZoneSettings;
use crate::util::time::{secs_to_ticks, TICKS_PER_SECOND};

use super::player::ParticipantId;
use super::scheduler::{TickScheduler, TimerToken};

/// Target radius of the stage that starts at `current`
pub fn next_target_radius(current: f64, final_radius: f64, shrink_factor: f64) -> f64 {
    (current * shrink_factor).max(final_radius)
}

/// Things the zone reports back to its match
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneEvent {
    ShrinkStarted { stage: u32, target_radius: f64 },
    StageComplete { stage: u32, radius: f64 },
    FinalZoneReached { radius: f64 },
    /// Damage owed by a participant standing outside the zone
    Damage {
        participant_id: ParticipantId,
        amount: f64,
    },
    Border { center: Position, radius: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneTimer {
    ShrinkStep,
    NextStage,
    DamageTick,
    BorderPulse,
}

#[derive(Debug)]
pub struct Zone {
    center: Position,
    current_radius: f64,
    target_radius: f64,
    shrinking: bool,
    stopped: bool,
    stage: u32,
    settings: ZoneSettings,
    timers: TickScheduler<ZoneTimer>,
    shrink_task: Option<TimerToken>,
    next_stage_task: Option<TimerToken>,
    damage_task: Option<TimerToken>,
    border_task: Option<TimerToken>,
}

impl Zone {
    /// Create a zone at full size. The damage tick (and border pulse, if enabled) starts immediately.
    pub fn new(center: Position, settings: ZoneSettings) -> Self {
        let mut timers = TickScheduler::new();
        let damage_task = Some(timers.schedule_repeating(
            0,
            settings.damage_interval_ticks,
            ZoneTimer::DamageTick,
        ));
        let border_task = settings.show_border.then(|| {
            timers.schedule_repeating(0, settings.border_interval_ticks, ZoneTimer::BorderPulse)
        });

        Self {
            center,
            current_radius: settings.initial_radius,
            target_radius: settings.initial_radius,
            shrinking: false,
            stopped: false,
            stage: 0,
            settings,
            timers,
            shrink_task: None,
            next_stage_task: None,
            damage_task,
            border_task,
        }
    }

    /// Begin the next shrink stage.
    ///
    /// No-op while a stage is animating, once the final radius is reached, or after
    /// [`Zone::stop_shrinking`].
    pub fn start_shrinking(&mut self) -> Option<ZoneEvent> {
        if self.stopped || self.shrinking || self.current_radius <= self.settings.final_radius {
            return None;
        }

        self.shrinking = true;
        self.stage += 1;
        self.target_radius = next_target_radius(
            self.current_radius,
            self.settings.final_radius,
            self.settings.shrink_factor,
        );
        self.shrink_task = Some(self.timers.schedule_repeating(
            0,
            TICKS_PER_SECOND,
            ZoneTimer::ShrinkStep,
        ));

        Some(ZoneEvent::ShrinkStarted {
            stage: self.stage,
            target_radius: self.target_radius,
        })
    }

    /// Cancel every timer the zone owns. The zone stays frozen afterwards.
    pub fn stop_shrinking(&mut self) {
        self.timers.cancel_all();
        self.shrink_task = None;
        self.next_stage_task = None;
        self.damage_task = None;
        self.border_task = None;
        self.shrinking = false;
        self.stopped = true;
    }

    /// Advance one logical tick. `alive` carries the last known position of every alive participant.
    pub fn tick(&mut self, alive: &[(ParticipantId, Position)]) -> Vec<ZoneEvent> {
        let mut events = Vec::new();

        while let Some((_, timer)) = self.timers.pop_due() {
            match timer {
                ZoneTimer::ShrinkStep => {
                    let stepped =
                        (self.current_radius - self.settings.shrink_rate).max(self.target_radius);
                    self.update_radius(stepped, &mut events);
                }
                ZoneTimer::NextStage => {
                    self.next_stage_task = None;
                    events.extend(self.start_shrinking());
                }
                ZoneTimer::DamageTick => {
                    for (participant_id, position) in alive {
                        if self.is_outside_zone(position) {
                            events.push(ZoneEvent::Damage {
                                participant_id: *participant_id,
                                amount: self.settings.damage_per_tick,
                            });
                        }
                    }
                }
                ZoneTimer::BorderPulse => events.push(ZoneEvent::Border {
                    center: self.center,
                    radius: self.current_radius,
                }),
            }
        }

        self.timers.finish_tick();
        events
    }

    fn update_radius(&mut self, radius: f64, events: &mut Vec<ZoneEvent>) {
        self.current_radius = radius;
        if self.current_radius > self.target_radius {
            return;
        }

        if let Some(task) = self.shrink_task.take() {
            self.timers.cancel(task);
        }
        self.shrinking = false;
        events.push(ZoneEvent::StageComplete {
            stage: self.stage,
            radius: self.current_radius,
        });

        if self.current_radius > self.settings.final_radius {
            let delay = secs_to_ticks(self.settings.shrink_interval_secs);
            self.next_stage_task = Some(self.timers.schedule_once(delay, ZoneTimer::NextStage));
        } else {
            events.push(ZoneEvent::FinalZoneReached {
                radius: self.current_radius,
            });
        }
    }

    pub fn is_outside_zone(&self, position: &Position) -> bool {
        position.distance(&self.center) > self.current_radius
    }

    /// Positive inside the zone, negative outside
    pub fn distance_from_edge(&self, position: &Position) -> f64 {
        self.current_radius - position.distance(&self.center)
    }

    pub fn center(&self) -> Position {
        self.center
    }

    pub fn current_radius(&self) -> f64 {
        self.current_radius
    }

    pub fn target_radius(&self) -> f64 {
        self.target_radius
    }

    pub fn is_shrinking(&self) -> bool {
        self.shrinking
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn is_final(&self) -> bool {
        self.current_radius <= self.settings.final_radius
    }

    /// Live timers owned by this zone
    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }
}
