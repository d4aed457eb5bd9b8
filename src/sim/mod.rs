//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual millisecond clock only (`TimerQueue`)
//! - Injected random source only
//! - Stable iteration order (by slot index)
//! - No rendering, audio or platform dependencies

pub mod difficulty;
pub mod hit;
pub mod holes;
pub mod kinds;
pub mod scheduler;
pub mod session;
pub mod spawn;
pub mod state;
pub mod timer;

pub use difficulty::Difficulty;
pub use hit::{HitOutcome, HitResolution, resolve_hit};
pub use holes::{EffectKind, HitEffect, HoleRegistry, HoleSlot, Occupant};
pub use kinds::{ALL_KINDS, PREY_CANDIDATES, SHERIFF_CANDIDATES, TargetKind};
pub use scheduler::{CountdownTick, LoopState, SchedulerLoop, SessionTimer, SpawnContext};
pub use session::GameSession;
pub use spawn::{RandomSource, ScriptedSource, choose_spawns};
pub use state::{
    Feedback, GameEvent, GameObserver, GamePhase, RoundState, RoundSummary, RoundVerdict,
    Snapshot, hole_anchor,
};
pub use timer::{Millis, TimerHandle, TimerQueue};
