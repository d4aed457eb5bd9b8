//! Spawn policy: which empty holes get a bug this tick, and which bug
//!
//! Pure function of its inputs plus an injected random source.

use std::collections::VecDeque;

use rand::Rng;

use super::difficulty::Difficulty;
use super::kinds::TargetKind;

/// Source of uniform random choices for spawning
pub trait RandomSource {
    /// Uniform index in `0..upper`. Callers never pass `upper == 0`.
    fn pick_index(&mut self, upper: usize) -> usize;

    /// Uniform integer in `low..=high`
    fn pick_inclusive(&mut self, low: u32, high: u32) -> u32 {
        if high <= low {
            return low;
        }
        low + self.pick_index((high - low + 1) as usize) as u32
    }
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn pick_index(&mut self, upper: usize) -> usize {
        self.random_range(0..upper)
    }
}

/// Replays a fixed list of picks (each taken modulo the requested range).
/// Returns 0 once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    picks: VecDeque<usize>,
}

impl ScriptedSource {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: picks.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.picks.len()
    }
}

impl RandomSource for ScriptedSource {
    fn pick_index(&mut self, upper: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % upper.max(1)
    }
}

/// Choose which empty slots to fill this tick.
///
/// Draw order: count, then (slot, kind) per spawn. Slots are sampled without
/// replacement from `empty_slots` in the order given; kinds come from the
/// full pool minus `excluded`.
pub fn choose_spawns<R: RandomSource + ?Sized>(
    rng: &mut R,
    empty_slots: &[usize],
    difficulty: Difficulty,
    excluded: TargetKind,
) -> Vec<(usize, TargetKind)> {
    if empty_slots.is_empty() {
        return Vec::new();
    }

    let drawn = rng.pick_inclusive(difficulty.min_spawn_count(), difficulty.max_spawn_count());
    let count = (drawn as usize).min(empty_slots.len());

    let kinds = TargetKind::pool_without(excluded);
    let mut pool = empty_slots.to_vec();
    let mut spawns = Vec::with_capacity(count);

    for _ in 0..count {
        let slot = pool.remove(rng.pick_index(pool.len()));
        let kind = kinds[rng.pick_index(kinds.len())];
        spawns.push((slot, kind));
    }

    spawns
}
