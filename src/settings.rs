//! Player configuration and game settings
//!
//! Persisted as JSON through a [`KeyValueStore`].

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::ROUND_DURATION_SECS;
use crate::error::{GameError, PersistenceError};
use crate::persistence::KeyValueStore;
use crate::sim::{Difficulty, TargetKind};

/// Who the player is and what they are hunting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerConfig {
    /// The player's avatar; never spawned as a target
    sheriff: TargetKind,
    /// Hitting these scores; always non-empty
    correct_kinds: BTreeSet<TargetKind>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sheriff: TargetKind::Ladybug,
            correct_kinds: Self::default_correct_kinds(),
        }
    }
}

impl PlayerConfig {
    /// Fails if `correct_kinds` is empty
    pub fn new(sheriff: TargetKind, correct_kinds: BTreeSet<TargetKind>) -> Option<Self> {
        if correct_kinds.is_empty() {
            return None;
        }
        Some(Self {
            sheriff,
            correct_kinds,
        })
    }

    fn default_correct_kinds() -> BTreeSet<TargetKind> {
        BTreeSet::from([TargetKind::Fly, TargetKind::Bee, TargetKind::Locust])
    }

    pub fn sheriff(&self) -> TargetKind {
        self.sheriff
    }

    pub fn correct_kinds(&self) -> &BTreeSet<TargetKind> {
        &self.correct_kinds
    }

    pub fn is_correct(&self, kind: TargetKind) -> bool {
        self.correct_kinds.contains(&kind)
    }

    pub fn select_sheriff(&mut self, kind: TargetKind) {
        self.sheriff = kind;
    }

    /// Add a kind to the catch list. Returns false if it was already there.
    pub fn add_correct_kind(&mut self, kind: TargetKind) -> bool {
        self.correct_kinds.insert(kind)
    }

    /// Remove a kind from the catch list; the last one cannot be removed
    pub fn remove_correct_kind(&mut self, kind: TargetKind) -> Result<bool, GameError> {
        if self.correct_kinds.len() == 1 && self.correct_kinds.contains(&kind) {
            return Err(GameError::LastCorrectKind(kind));
        }
        Ok(self.correct_kinds.remove(&kind))
    }

    /// Setup-screen toggle. Removing the last kind is silently ignored.
    /// Returns whether the kind is on the list afterwards.
    pub fn toggle_correct_kind(&mut self, kind: TargetKind) -> bool {
        if !self.is_correct(kind) {
            self.add_correct_kind(kind);
            return true;
        }
        if let Err(err) = self.remove_correct_kind(kind) {
            log::debug!("toggle ignored: {}", err);
        }
        self.is_correct(kind)
    }
}

impl<'de> Deserialize<'de> for PlayerConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            sheriff: TargetKind,
            #[serde(default)]
            correct_kinds: BTreeSet<TargetKind>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let correct_kinds = if raw.correct_kinds.is_empty() {
            log::warn!("stored player config had no correct kinds, using defaults");
            Self::default_correct_kinds()
        } else {
            raw.correct_kinds
        };
        Ok(Self {
            sheriff: raw.sheriff,
            correct_kinds,
        })
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub player: PlayerConfig,
    pub difficulty: Difficulty,
    /// Length of a round in seconds
    #[serde(default = "default_round_duration")]
    pub round_duration_secs: u32,
    /// Suppress sound cues
    #[serde(default)]
    pub muted: bool,
}

fn default_round_duration() -> u32 {
    ROUND_DURATION_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            difficulty: Difficulty::Normal,
            round_duration_secs: ROUND_DURATION_SECS,
            muted: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "ladybug_settings";

    /// Load settings, falling back to defaults on missing or bad data
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(mut settings) => {
                    settings.round_duration_secs = settings.round_duration_secs.max(1);
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(err) => log::warn!("Ignoring stored settings: {}", err),
            },
            Ok(None) => {}
            Err(err) => log::warn!("Could not read settings: {}", err),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings; failures are logged and otherwise ignored
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        let result = serde_json::to_string(self)
            .map_err(PersistenceError::from)
            .and_then(|json| store.set(Self::STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(err) => log::warn!("Could not save settings: {}", err),
        }
    }
}
