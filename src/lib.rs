//! Ladybug Sheriff - a whack-a-bug reaction game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (holes, spawning, timers, scoring, phases)
//! - `settings`: Player configuration and preferences
//! - `highscores`: Best score tracking
//! - `persistence`: Key-value storage backends
//! - `audio`: Sound cue selection for the host
//! - `platform`: Browser/native platform glue

pub mod audio;
pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::{GameError, PersistenceError};
pub use highscores::HighScore;
pub use settings::{PlayerConfig, Settings};
pub use sim::{Difficulty, GameEvent, GamePhase, GameSession, HitOutcome, TargetKind};

/// Game configuration constants
pub mod consts {
    /// Holes in the grid
    pub const GRID_SIZE: usize = 9;
    /// Grid is laid out 3x3
    pub const GRID_COLUMNS: usize = 3;

    /// Round length
    pub const ROUND_DURATION_SECS: u32 = 60;
    /// Spawn cadence
    pub const SPAWN_INTERVAL_MS: u64 = 1000;
    pub const COUNTDOWN_INTERVAL_MS: u64 = 1000;

    /// Scoring
    pub const CATCH_POINTS: u32 = 10;
    pub const MISS_PENALTY: u32 = 5;

    /// How long a hit bug stays on screen before the hole empties
    pub const CATCH_EFFECT_MS: u64 = 600;
    pub const MISS_EFFECT_MS: u64 = 800;
    /// Floating score text lifetime
    pub const FEEDBACK_TTL_MS: u64 = 800;
}
