//! Hit resolution against the exact occupant of a hole
//!
//! Precondition order matters: not running, empty hole, effect in flight.
//! A hit that loses a race with an auto-retract lands on an empty hole and
//! is a no-op.

use serde::{Deserialize, Serialize};

use super::holes::EffectKind;
use super::scheduler::SessionTimer;
use super::state::RoundState;
use super::timer::TimerQueue;
use crate::consts::{CATCH_EFFECT_MS, CATCH_POINTS, MISS_EFFECT_MS, MISS_PENALTY};
use crate::settings::PlayerConfig;

/// What a hit did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitOutcome {
    /// Round not running, or nothing in the hole
    NoTarget,
    /// The hole is still playing its previous result
    AlreadyResolving,
    /// Caught a target from the player's list
    Correct,
    /// Hit something not on the list
    Incorrect,
}

impl HitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            HitOutcome::NoTarget => "NoTarget",
            HitOutcome::AlreadyResolving => "AlreadyResolving",
            HitOutcome::Correct => "Correct",
            HitOutcome::Incorrect => "Incorrect",
        }
    }
}

/// Outcome plus the score change actually applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitResolution {
    pub outcome: HitOutcome,
    /// +10 on a catch, -5 (less if the score was under 5) on a wrong hit, else 0
    pub score_delta: i32,
}

impl HitResolution {
    fn no_op(outcome: HitOutcome) -> Self {
        Self {
            outcome,
            score_delta: 0,
        }
    }

    /// Whether the hit changed anything
    pub fn accepted(&self) -> bool {
        matches!(self.outcome, HitOutcome::Correct | HitOutcome::Incorrect)
    }
}

/// Resolve a hit on `slot`. On acceptance the hole's retract timer is
/// replaced by an effect timer that empties the hole when it fires.
pub fn resolve_hit(
    round: &mut RoundState,
    timers: &mut TimerQueue<SessionTimer>,
    slot: usize,
    player: &PlayerConfig,
    running: bool,
) -> HitResolution {
    if !running {
        return HitResolution::no_op(HitOutcome::NoTarget);
    }
    let Some(kind) = round.holes.occupant_of(slot) else {
        return HitResolution::no_op(HitOutcome::NoTarget);
    };
    if round.holes.effect_of(slot).is_some() {
        return HitResolution::no_op(HitOutcome::AlreadyResolving);
    }

    let correct = player.is_correct(kind);
    let (effect, hold_ms) = if correct {
        (EffectKind::Caught, CATCH_EFFECT_MS)
    } else {
        (EffectKind::Missed, MISS_EFFECT_MS)
    };
    if round.holes.hold_for_effect(timers, slot, effect, hold_ms).is_none() {
        log::warn!("hit on slot {} could not take over its timer", slot);
        return HitResolution::no_op(HitOutcome::NoTarget);
    }

    let resolution = if correct {
        HitResolution {
            outcome: HitOutcome::Correct,
            score_delta: round.award(CATCH_POINTS),
        }
    } else {
        HitResolution {
            outcome: HitOutcome::Incorrect,
            score_delta: round.penalize(MISS_PENALTY),
        }
    };
    log::debug!(
        "hit slot {} on {:?}: {:?} ({:+}), score {}",
        slot,
        kind,
        resolution.outcome,
        resolution.score_delta,
        round.score
    );
    resolution
}
