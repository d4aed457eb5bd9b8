//! Error types
//!
//! The core has no I/O failure modes; `GameError` only guards preconditions
//! that callers are expected to respect. Storage errors are separate so the
//! session can log and carry on.

use thiserror::Error;

use crate::sim::{GamePhase, TargetKind};

/// Rejected gameplay or configuration operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Slot index outside the grid
    #[error("slot {slot} is out of range (grid has {len} slots)")]
    SlotOutOfRange { slot: usize, len: usize },
    /// Tried to activate a slot that already holds a target
    #[error("slot {slot} is already occupied")]
    SlotOccupied { slot: usize },
    /// Command not valid in the current phase
    #[error("cannot {action} while in {from:?}")]
    InvalidTransition { from: GamePhase, action: &'static str },
    /// Removing this kind would leave the player with nothing to catch
    #[error("{0:?} is the last correct kind and cannot be removed")]
    LastCorrectKind(TargetKind),
}

/// Failure reading or writing persisted values
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
