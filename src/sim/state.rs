//! Round state, phases and the events the core emits
//!
//! Rendering and audio only ever see this module's outputs: snapshots to
//! draw from and events to react to.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::difficulty::Difficulty;
use super::hit::HitOutcome;
use super::holes::{EffectKind, HitEffect, HoleRegistry};
use super::kinds::TargetKind;
use crate::consts::GRID_COLUMNS;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen
    Menu,
    /// Choosing sheriff, targets and difficulty
    Setup,
    /// Round running
    Playing,
    /// Round frozen by the player
    Paused,
    /// Countdown ran out
    GameOver,
}

/// Mutable truth of one round
#[derive(Debug, Clone)]
pub struct RoundState {
    pub score: u32,
    pub time_remaining_secs: u32,
    pub holes: HoleRegistry,
}

impl RoundState {
    pub fn new(grid_size: usize, duration_secs: u32) -> Self {
        Self {
            score: 0,
            time_remaining_secs: duration_secs,
            holes: HoleRegistry::new(grid_size),
        }
    }

    /// Add points for a catch
    pub fn award(&mut self, points: u32) -> i32 {
        self.score = self.score.saturating_add(points);
        points as i32
    }

    /// Deduct points, never going below zero. Returns the signed change applied.
    pub fn penalize(&mut self, points: u32) -> i32 {
        let before = self.score;
        self.score = self.score.saturating_sub(points);
        self.score as i32 - before as i32
    }
}

/// Floating "+10" / "-5" text over a hole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub slot: usize,
    pub effect: EffectKind,
    pub text: String,
    /// Hole center in normalized grid space (0..1 on both axes)
    pub anchor: Vec2,
    pub ttl_ms: u64,
}

/// Center of a hole in normalized grid space, row-major layout
pub fn hole_anchor(slot: usize, grid_size: usize) -> Vec2 {
    let columns = GRID_COLUMNS.max(1);
    let rows = grid_size.div_ceil(columns).max(1);
    let col = slot % columns;
    let row = slot / columns;
    Vec2::new(
        (col as f32 + 0.5) / columns as f32,
        (row as f32 + 0.5) / rows as f32,
    )
}

/// Something observers may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    Spawned { slot: usize, kind: TargetKind },
    /// Target retracted unhit (no penalty)
    Expired { slot: usize },
    HitResolved {
        slot: usize,
        outcome: HitOutcome,
        score_delta: i32,
    },
    Feedback(Feedback),
    /// Hit animation done, hole is empty again
    EffectFinished { slot: usize, effect: HitEffect },
    TimeTick { remaining: u32 },
    PhaseChanged { from: GamePhase, to: GamePhase },
    NewHighScore { score: u32 },
    RoundEnded { final_score: u32 },
}

/// Fire-and-forget listener for core events. Every method defaults to a no-op.
pub trait GameObserver {
    fn on_spawn(&mut self, _slot: usize, _kind: TargetKind) {}
    fn on_expire(&mut self, _slot: usize) {}
    fn on_hit_resolved(&mut self, _slot: usize, _outcome: HitOutcome, _score_delta: i32) {}
    fn on_round_end(&mut self, _final_score: u32) {}
    /// Called for every event, including the ones above
    fn on_event(&mut self, _event: &GameEvent) {}
}

impl GameEvent {
    /// Deliver to the matching observer hook
    pub fn dispatch(&self, observer: &mut dyn GameObserver) {
        match self {
            GameEvent::Spawned { slot, kind } => observer.on_spawn(*slot, *kind),
            GameEvent::Expired { slot } => observer.on_expire(*slot),
            GameEvent::HitResolved {
                slot,
                outcome,
                score_delta,
            } => observer.on_hit_resolved(*slot, *outcome, *score_delta),
            GameEvent::RoundEnded { final_score } => observer.on_round_end(*final_score),
            _ => {}
        }
        observer.on_event(self);
    }
}

/// How the round went, by final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundVerdict {
    /// Under 100
    Failed,
    /// 100 to 200
    Success,
    /// Over 200
    GreatSuccess,
}

impl RoundVerdict {
    pub fn for_score(score: u32) -> Self {
        match score {
            0..=99 => RoundVerdict::Failed,
            100..=200 => RoundVerdict::Success,
            _ => RoundVerdict::GreatSuccess,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundVerdict::Failed => "Operation failed",
            RoundVerdict::Success => "Operation successful",
            RoundVerdict::GreatSuccess => "Outstanding work, sheriff!",
        }
    }
}

/// Game-over screen data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub final_score: u32,
    pub high_score: u32,
    pub new_record: bool,
    pub verdict: RoundVerdict,
}

impl RoundSummary {
    pub fn new(final_score: u32, high_score: u32) -> Self {
        Self {
            final_score,
            high_score,
            new_record: final_score > 0 && final_score >= high_score,
            verdict: RoundVerdict::for_score(final_score),
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub grid: Vec<Option<TargetKind>>,
    pub effects: Vec<Option<EffectKind>>,
    pub score: u32,
    pub high_score: u32,
    pub time_remaining_secs: u32,
    pub difficulty: Difficulty,
    pub sheriff: TargetKind,
    pub correct_kinds: Vec<TargetKind>,
    pub muted: bool,
}
