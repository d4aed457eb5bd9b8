//! Sound cues for the audio layer
//!
//! The core does not make sound. It tells the host which cue to play for
//! each event; synthesis and music live outside the crate.

use serde::{Deserialize, Serialize};

use crate::sim::{GameEvent, GamePhase, HitOutcome};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Menu/button click
    Click,
    /// Correct target caught
    Score,
    /// Hammer impact on a catch
    Hit,
    /// Wrong target hit
    Error,
    /// Countdown ran out
    GameOver,
    /// Start background music
    MusicStart,
    /// Stop background music
    MusicStop,
}

impl SoundCue {
    /// Cues to play for an event, in order
    pub fn for_event(event: &GameEvent) -> Vec<SoundCue> {
        match event {
            GameEvent::HitResolved { outcome, .. } => match outcome {
                HitOutcome::Correct => vec![SoundCue::Score, SoundCue::Hit],
                HitOutcome::Incorrect => vec![SoundCue::Error],
                HitOutcome::NoTarget | HitOutcome::AlreadyResolving => Vec::new(),
            },
            GameEvent::RoundEnded { .. } => vec![SoundCue::GameOver, SoundCue::MusicStop],
            GameEvent::PhaseChanged { to, .. } => match to {
                GamePhase::Setup | GamePhase::Playing => vec![SoundCue::Click, SoundCue::MusicStart],
                GamePhase::Paused | GamePhase::Menu => vec![SoundCue::Click],
                // GameOver already cued by RoundEnded
                GamePhase::GameOver => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

/// Collects cues from events, honoring mute
#[derive(Debug, Clone, Default)]
pub struct CueQueue {
    muted: bool,
    queued: Vec<SoundCue>,
}

impl CueQueue {
    pub fn new(muted: bool) -> Self {
        Self {
            muted,
            queued: Vec::new(),
        }
    }

    /// Mute or unmute. Muting drops anything not yet played.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.queued.clear();
        }
    }

    pub fn push_event(&mut self, event: &GameEvent) {
        if !self.muted {
            self.queued.extend(SoundCue::for_event(event));
        }
    }

    /// Take all queued cues
    pub fn drain(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.queued)
    }
}
