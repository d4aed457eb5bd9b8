//! Scheduler loop: countdown and spawn cadence for a running round
//!
//! Owns the two repeating timers. Stopping cancels them and empties every
//! hole, which also cancels every per-hole timer, so nothing scheduled
//! during a round can fire after it.

use super::difficulty::Difficulty;
use super::holes::HoleRegistry;
use super::kinds::TargetKind;
use super::spawn::{RandomSource, choose_spawns};
use super::state::{GameEvent, RoundState};
use super::timer::{TimerHandle, TimerQueue};
use crate::consts::{COUNTDOWN_INTERVAL_MS, SPAWN_INTERVAL_MS};

/// Payload of every timer a session schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTimer {
    /// One second of round time elapsed
    Countdown,
    /// Try to spawn a new batch
    SpawnTick,
    /// Auto-retract of an unhit target
    Retract { slot: usize, activation: u64 },
    /// Hit result finished playing
    EffectDone { slot: usize, activation: u64 },
}

/// Loop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Result of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Continue { remaining: u32 },
    Expired,
}

/// Inputs for a spawn pass
pub struct SpawnContext<'a> {
    pub rng: &'a mut dyn RandomSource,
    pub difficulty: Difficulty,
    /// The sheriff's own kind, never spawned
    pub excluded: TargetKind,
}

/// Drives spawning and the countdown while a round is playing
#[derive(Debug)]
pub struct SchedulerLoop {
    state: LoopState,
    countdown: Option<TimerHandle>,
    spawn: Option<TimerHandle>,
}

impl Default for SchedulerLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Stopped,
            countdown: None,
            spawn: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Start the cadence and run one spawn pass immediately.
    /// `reset_duration` resets the round (fresh start); `None` resumes it.
    /// Returns false if already running.
    pub fn start(
        &mut self,
        timers: &mut TimerQueue<SessionTimer>,
        round: &mut RoundState,
        reset_duration: Option<u32>,
        ctx: SpawnContext<'_>,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        if self.is_running() {
            return false;
        }
        if let Some(duration) = reset_duration {
            round.holes.clear_all(timers);
            *round = RoundState::new(round.holes.len(), duration);
        }

        self.countdown = Some(timers.schedule_repeating(COUNTDOWN_INTERVAL_MS, SessionTimer::Countdown));
        self.spawn = Some(timers.schedule_repeating(SPAWN_INTERVAL_MS, SessionTimer::SpawnTick));
        self.state = LoopState::Running;
        log::debug!(
            "scheduler started ({}), {}s left",
            if reset_duration.is_some() { "fresh" } else { "resume" },
            round.time_remaining_secs
        );

        self.spawn_pass(timers, &mut round.holes, ctx, events);
        true
    }

    /// Cancel the cadence and every hole timer, emptying the grid
    pub fn stop(&mut self, timers: &mut TimerQueue<SessionTimer>, round: &mut RoundState) {
        if let Some(handle) = self.countdown.take() {
            timers.cancel(handle);
        }
        if let Some(handle) = self.spawn.take() {
            timers.cancel(handle);
        }
        round.holes.clear_all(timers);
        if self.state == LoopState::Running {
            log::debug!("scheduler stopped, {} timers left", timers.pending_count());
        }
        self.state = LoopState::Stopped;
    }

    /// One second passed. Reaching zero ends the round.
    pub fn on_countdown(&mut self, round: &mut RoundState) -> CountdownTick {
        round.time_remaining_secs = round.time_remaining_secs.saturating_sub(1);
        if round.time_remaining_secs == 0 {
            CountdownTick::Expired
        } else {
            CountdownTick::Continue {
                remaining: round.time_remaining_secs,
            }
        }
    }

    /// Fill some empty holes. Returns how many were activated.
    pub fn spawn_pass(
        &mut self,
        timers: &mut TimerQueue<SessionTimer>,
        holes: &mut HoleRegistry,
        ctx: SpawnContext<'_>,
        events: &mut Vec<GameEvent>,
    ) -> usize {
        if !self.is_running() {
            return 0;
        }

        let empty = holes.empty_slots();
        let stay_ms = ctx.difficulty.stay_duration_ms();
        let mut spawned = 0;

        for (slot, kind) in choose_spawns(ctx.rng, &empty, ctx.difficulty, ctx.excluded) {
            match holes.activate(timers, slot, kind, stay_ms) {
                Ok(_) => {
                    log::debug!("spawned {:?} in slot {}", kind, slot);
                    events.push(GameEvent::Spawned { slot, kind });
                    spawned += 1;
                }
                Err(err) => log::warn!("spawn skipped: {}", err),
            }
        }
        spawned
    }
}
