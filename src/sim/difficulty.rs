//! Difficulty presets

use serde::{Deserialize, Serialize};

use super::timer::Millis;

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Fewest targets activated per spawn tick
    pub fn min_spawn_count(&self) -> u32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Normal => 1,
            Difficulty::Hard => 2,
        }
    }

    /// Most targets activated per spawn tick
    pub fn max_spawn_count(&self) -> u32 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Normal => 3,
            Difficulty::Hard => 4,
        }
    }

    /// How long an unhit target stays up
    pub fn stay_duration_ms(&self) -> Millis {
        match self {
            Difficulty::Easy => 2500,
            Difficulty::Normal => 2000,
            Difficulty::Hard => 1500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_ranges_are_ordered() {
        for d in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert!(d.min_spawn_count() >= 1);
            assert!(d.min_spawn_count() <= d.max_spawn_count());
        }
    }

    #[test]
    fn test_normal_matches_classic_tuning() {
        let d = Difficulty::Normal;
        assert_eq!((d.min_spawn_count(), d.max_spawn_count()), (1, 3));
        assert_eq!(d.stay_duration_ms(), 2000);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }
}
