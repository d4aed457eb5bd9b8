//! Best score ever reached
//!
//! A single integer, persisted under a fixed key and rewritten whenever the
//! running score beats it.

use crate::persistence::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScore {
    best: u32,
}

impl HighScore {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "ladybug_highscore";

    pub fn new(best: u32) -> Self {
        Self { best }
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    /// Read the stored value. Missing or unparseable means zero.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<u32>() {
                Ok(best) => {
                    log::info!("Loaded high score {}", best);
                    return Self { best };
                }
                Err(err) => log::warn!("Ignoring stored high score {:?}: {}", raw, err),
            },
            Ok(None) => log::info!("No high score found, starting fresh"),
            Err(err) => log::warn!("Could not read high score: {}", err),
        }
        Self::default()
    }

    /// Raise the record if `score` beats it, persisting the new value.
    /// Returns true if it was a new record.
    pub fn record(&mut self, score: u32, store: &mut dyn KeyValueStore) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        if let Err(err) = store.set(Self::STORAGE_KEY, &score.to_string()) {
            log::warn!("Could not save high score: {}", err);
        }
        true
    }
}
