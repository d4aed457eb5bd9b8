//! Hole registry: the fixed row of slots and what currently occupies each
//!
//! An occupied slot always owns exactly one pending timer. While the bug is
//! idle that is its auto-retract; once a hit lands it is swapped for the
//! hit-effect completion timer. Empty slots own nothing, so "empty iff no
//! pending timer" holds by construction.

use serde::{Deserialize, Serialize};

use super::kinds::TargetKind;
use super::scheduler::SessionTimer;
use super::timer::{Millis, TimerHandle, TimerQueue};
use crate::error::GameError;

/// Result animation shown on a hole after a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Correct target caught
    Caught,
    /// Wrong target hit
    Missed,
}

/// Transient marker blocking re-resolution of a hole while its result plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitEffect {
    pub slot: usize,
    pub kind: EffectKind,
    pub created_at: Millis,
}

/// What sits in an occupied hole
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub kind: TargetKind,
    /// Unique per activation; timers carry it to detect reuse
    pub activation: u64,
    /// Retract timer, or effect completion timer once `effect` is set
    pub pending: TimerHandle,
    pub effect: Option<HitEffect>,
}

/// One grid position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleSlot {
    pub index: usize,
    occupant: Option<Occupant>,
}

impl HoleSlot {
    pub fn occupant(&self) -> Option<&Occupant> {
        self.occupant.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// Fixed-size set of holes
#[derive(Debug, Clone)]
pub struct HoleRegistry {
    slots: Box<[HoleSlot]>,
    next_activation: u64,
}

impl HoleRegistry {
    /// Create `len` empty holes
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len)
                .map(|index| HoleSlot { index, occupant: None })
                .collect(),
            next_activation: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[HoleSlot] {
        &self.slots
    }

    /// Put `kind` into an empty slot and arm its auto-retract
    pub fn activate(
        &mut self,
        timers: &mut TimerQueue<SessionTimer>,
        slot: usize,
        kind: TargetKind,
        stay_ms: Millis,
    ) -> Result<u64, GameError> {
        let len = self.slots.len();
        let hole = self
            .slots
            .get_mut(slot)
            .ok_or(GameError::SlotOutOfRange { slot, len })?;
        if hole.occupant.is_some() {
            return Err(GameError::SlotOccupied { slot });
        }

        let activation = self.next_activation;
        self.next_activation += 1;
        let pending = timers.schedule_once(stay_ms, SessionTimer::Retract { slot, activation });
        hole.occupant = Some(Occupant {
            kind,
            activation,
            pending,
            effect: None,
        });
        Ok(activation)
    }

    /// Auto-retract firing. Clears the slot only if it still holds the same
    /// idle activation; returns whether it did.
    pub fn expire(
        &mut self,
        timers: &mut TimerQueue<SessionTimer>,
        slot: usize,
        activation: u64,
    ) -> bool {
        let still_idle = self
            .occupant(slot)
            .is_some_and(|o| o.activation == activation && o.effect.is_none());
        if still_idle {
            self.clear(timers, slot);
        }
        still_idle
    }

    /// Swap the slot's retract timer for an effect completion timer.
    /// The retract is cancelled before anything else changes.
    pub fn hold_for_effect(
        &mut self,
        timers: &mut TimerQueue<SessionTimer>,
        slot: usize,
        kind: EffectKind,
        hold_ms: Millis,
    ) -> Option<HitEffect> {
        let now = timers.now();
        let occupant = self.slots.get_mut(slot)?.occupant.as_mut()?;
        if occupant.effect.is_some() {
            return None;
        }

        timers.cancel(occupant.pending);
        let effect = HitEffect {
            slot,
            kind,
            created_at: now,
        };
        occupant.pending = timers.schedule_once(
            hold_ms,
            SessionTimer::EffectDone {
                slot,
                activation: occupant.activation,
            },
        );
        occupant.effect = Some(effect);
        Some(effect)
    }

    /// Effect completion firing. Clears the slot if it is still showing the
    /// effect for this activation and returns the finished effect.
    pub fn finish_effect(
        &mut self,
        timers: &mut TimerQueue<SessionTimer>,
        slot: usize,
        activation: u64,
    ) -> Option<HitEffect> {
        let effect = self
            .occupant(slot)
            .filter(|o| o.activation == activation)
            .and_then(|o| o.effect)?;
        self.clear(timers, slot);
        Some(effect)
    }

    /// Empty a slot, cancelling whatever it had pending. Idempotent; returns
    /// whether anything was removed.
    pub fn clear(&mut self, timers: &mut TimerQueue<SessionTimer>, slot: usize) -> bool {
        let Some(hole) = self.slots.get_mut(slot) else {
            log::warn!("clear on out-of-range slot {}", slot);
            return false;
        };
        match hole.occupant.take() {
            Some(occupant) => {
                timers.cancel(occupant.pending);
                true
            }
            None => false,
        }
    }

    /// Empty every slot
    pub fn clear_all(&mut self, timers: &mut TimerQueue<SessionTimer>) {
        for slot in 0..self.slots.len() {
            self.clear(timers, slot);
        }
    }

    pub fn occupant(&self, slot: usize) -> Option<&Occupant> {
        self.slots.get(slot).and_then(|h| h.occupant.as_ref())
    }

    /// Kind in the slot, `None` when empty (or out of range)
    pub fn occupant_of(&self, slot: usize) -> Option<TargetKind> {
        self.occupant(slot).map(|o| o.kind)
    }

    pub fn effect_of(&self, slot: usize) -> Option<HitEffect> {
        self.occupant(slot).and_then(|o| o.effect)
    }

    pub fn pending_handle(&self, slot: usize) -> Option<TimerHandle> {
        self.occupant(slot).map(|o| o.pending)
    }

    /// Indices of empty slots, ascending
    pub fn empty_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|h| h.is_empty())
            .map(|h| h.index)
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.len() - self.empty_slots().len()
    }

    /// Kind per slot, for renderers
    pub fn snapshot(&self) -> Vec<Option<TargetKind>> {
        self.slots
            .iter()
            .map(|h| h.occupant.as_ref().map(|o| o.kind))
            .collect()
    }

    /// Active effect per slot, for renderers
    pub fn effects(&self) -> Vec<Option<EffectKind>> {
        self.slots
            .iter()
            .map(|h| h.occupant.as_ref().and_then(|o| o.effect).map(|e| e.kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (HoleRegistry, TimerQueue<SessionTimer>) {
        (HoleRegistry::new(9), TimerQueue::new())
    }

    /// Occupied iff a live timer is pending for the slot
    fn assert_occupancy_invariant(holes: &HoleRegistry, timers: &TimerQueue<SessionTimer>) {
        for slot in 0..holes.len() {
            match holes.pending_handle(slot) {
                Some(handle) => {
                    assert!(holes.occupant_of(slot).is_some());
                    assert!(timers.is_pending(handle), "slot {} has a dead handle", slot);
                }
                None => assert!(holes.occupant_of(slot).is_none()),
            }
        }
    }

    #[test]
    fn test_activate_and_query() {
        let (mut holes, mut timers) = setup();
        holes.activate(&mut timers, 3, TargetKind::Fly, 2000).unwrap();
        holes.activate(&mut timers, 7, TargetKind::Bee, 2000).unwrap();

        assert_eq!(holes.occupant_of(3), Some(TargetKind::Fly));
        assert_eq!(holes.occupant_of(7), Some(TargetKind::Bee));
        assert_eq!(holes.empty_slots(), vec![0, 1, 2, 4, 5, 6, 8]);
        assert_eq!(timers.pending_count(), 2);
        assert_occupancy_invariant(&holes, &timers);
    }

    #[test]
    fn test_activate_occupied_slot_fails() {
        let (mut holes, mut timers) = setup();
        holes.activate(&mut timers, 0, TargetKind::Fly, 2000).unwrap();
        assert_eq!(
            holes.activate(&mut timers, 0, TargetKind::Bee, 2000),
            Err(GameError::SlotOccupied { slot: 0 })
        );
        assert_eq!(holes.occupant_of(0), Some(TargetKind::Fly));
        assert_eq!(timers.pending_count(), 1);
    }

    #[test]
    fn test_activate_out_of_range() {
        let (mut holes, mut timers) = setup();
        assert_eq!(
            holes.activate(&mut timers, 9, TargetKind::Fly, 2000),
            Err(GameError::SlotOutOfRange { slot: 9, len: 9 })
        );
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (mut holes, mut timers) = setup();
        holes.activate(&mut timers, 2, TargetKind::Locust, 2000).unwrap();

        assert!(holes.clear(&mut timers, 2));
        let after_first = holes.snapshot();
        assert!(!holes.clear(&mut timers, 2));
        assert!(!holes.clear(&mut timers, 2));
        assert_eq!(holes.snapshot(), after_first);
        assert_eq!(timers.pending_count(), 0);

        // Out of range is a no-op too
        assert!(!holes.clear(&mut timers, 42));
    }

    #[test]
    fn test_expire_ignores_reused_slot() {
        let (mut holes, mut timers) = setup();
        let first = holes.activate(&mut timers, 1, TargetKind::Fly, 2000).unwrap();
        holes.clear(&mut timers, 1);
        let second = holes.activate(&mut timers, 1, TargetKind::Bee, 2000).unwrap();
        assert_ne!(first, second);

        // A stale retract for the first activation must not touch the second
        assert!(!holes.expire(&mut timers, 1, first));
        assert_eq!(holes.occupant_of(1), Some(TargetKind::Bee));

        assert!(holes.expire(&mut timers, 1, second));
        assert_eq!(holes.occupant_of(1), None);
        assert_occupancy_invariant(&holes, &timers);
    }

    #[test]
    fn test_hold_for_effect_swaps_timer() {
        let (mut holes, mut timers) = setup();
        let activation = holes.activate(&mut timers, 4, TargetKind::Fly, 2000).unwrap();
        let retract = holes.pending_handle(4).unwrap();

        let effect = holes
            .hold_for_effect(&mut timers, 4, EffectKind::Caught, 600)
            .unwrap();
        assert_eq!(effect.kind, EffectKind::Caught);
        assert!(!timers.is_pending(retract));
        assert_eq!(timers.pending_count(), 1);
        assert_eq!(holes.occupant_of(4), Some(TargetKind::Fly));
        assert_occupancy_invariant(&holes, &timers);

        // Second hold on the same slot is refused
        assert!(holes.hold_for_effect(&mut timers, 4, EffectKind::Missed, 800).is_none());

        // Expiry cannot clear a slot that is showing an effect
        assert!(!holes.expire(&mut timers, 4, activation));

        let finished = holes.finish_effect(&mut timers, 4, activation).unwrap();
        assert_eq!(finished, effect);
        assert_eq!(holes.occupant_of(4), None);
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn test_clear_all_cancels_everything() {
        let (mut holes, mut timers) = setup();
        for slot in 0..9 {
            holes.activate(&mut timers, slot, TargetKind::Bee, 2000).unwrap();
        }
        holes.hold_for_effect(&mut timers, 0, EffectKind::Caught, 600);
        holes.clear_all(&mut timers);

        assert_eq!(holes.empty_slots().len(), 9);
        assert_eq!(timers.pending_count(), 0);
        assert_occupancy_invariant(&holes, &timers);
    }
}
