//! Bug species that can pop out of a hole

use serde::{Deserialize, Serialize};

/// A bug species. An empty hole is `None` wherever an `Option<TargetKind>` appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TargetKind {
    Ladybug,
    BlackAnt,
    Spider,
    Caterpillar,
    Fly,
    Bee,
    RedAnt,
    Dragonfly,
    Locust,
}

/// Kinds offered as the player's sheriff
pub const SHERIFF_CANDIDATES: [TargetKind; 4] = [
    TargetKind::Ladybug,
    TargetKind::BlackAnt,
    TargetKind::Spider,
    TargetKind::Caterpillar,
];

/// Kinds offered as "catch these" targets during setup
pub const PREY_CANDIDATES: [TargetKind; 5] = [
    TargetKind::Fly,
    TargetKind::Bee,
    TargetKind::RedAnt,
    TargetKind::Dragonfly,
    TargetKind::Locust,
];

/// Full catchable pool, in spawn-table order (sheriff candidates first)
pub const ALL_KINDS: [TargetKind; 9] = [
    TargetKind::Ladybug,
    TargetKind::BlackAnt,
    TargetKind::Spider,
    TargetKind::Caterpillar,
    TargetKind::Fly,
    TargetKind::Bee,
    TargetKind::RedAnt,
    TargetKind::Dragonfly,
    TargetKind::Locust,
];

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Ladybug => "Ladybug",
            TargetKind::BlackAnt => "Black Ant",
            TargetKind::Spider => "Spider",
            TargetKind::Caterpillar => "Caterpillar",
            TargetKind::Fly => "Fly",
            TargetKind::Bee => "Bee",
            TargetKind::RedAnt => "Red Ant",
            TargetKind::Dragonfly => "Dragonfly",
            TargetKind::Locust => "Locust",
        }
    }

    /// Parse a kind name, ignoring case, spaces and underscores
    pub fn from_str(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        ALL_KINDS
            .iter()
            .copied()
            .find(|kind| kind.as_str().replace(' ', "").to_lowercase() == key)
    }

    /// Every kind in the pool except `excluded`
    pub fn pool_without(excluded: TargetKind) -> Vec<TargetKind> {
        ALL_KINDS.iter().copied().filter(|k| *k != excluded).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_variants() {
        assert_eq!(TargetKind::from_str("red_ant"), Some(TargetKind::RedAnt));
        assert_eq!(TargetKind::from_str("Red Ant"), Some(TargetKind::RedAnt));
        assert_eq!(TargetKind::from_str("REDANT"), Some(TargetKind::RedAnt));
        assert_eq!(TargetKind::from_str("dragonfly"), Some(TargetKind::Dragonfly));
        assert_eq!(TargetKind::from_str("mole"), None);
    }

    #[test]
    fn test_candidate_pools_partition_all_kinds() {
        let mut joined: Vec<TargetKind> = SHERIFF_CANDIDATES
            .iter()
            .chain(PREY_CANDIDATES.iter())
            .copied()
            .collect();
        joined.sort();
        let mut all = ALL_KINDS.to_vec();
        all.sort();
        assert_eq!(joined, all);
    }

    #[test]
    fn test_pool_without() {
        let pool = TargetKind::pool_without(TargetKind::Ladybug);
        assert_eq!(pool.len(), 8);
        assert!(!pool.contains(&TargetKind::Ladybug));
        assert_eq!(pool[3], TargetKind::Fly);
        assert_eq!(pool[4], TargetKind::Bee);
    }
}
