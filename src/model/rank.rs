use serde::{Deserialize, Serialize};

/// A named tier derived from the level.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Rank {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

serde_plain::derive_display_from_serialize!(Rank);
serde_plain::derive_fromstr_from_deserialize!(Rank);

/// Lowest level of each rank, highest first. The last band starts at 0 so every level has a rank.
const RANK_THRESHOLDS: [(u32, Rank); 4] = [
    (200, Rank::Platinum),
    (100, Rank::Gold),
    (50, Rank::Silver),
    (0, Rank::Bronze),
];

impl Rank {
    /// Returns the rank for `level`, checking thresholds from the highest down.
    pub fn for_level(level: u32) -> Rank {
        RANK_THRESHOLDS
            .iter()
            .find(|(min, _)| level >= *min)
            .map(|(_, rank)| *rank)
            .unwrap_or(Rank::Bronze)
    }

    /// The lowest level at which this rank is reached.
    pub fn min_level(&self) -> u32 {
        RANK_THRESHOLDS
            .iter()
            .find(|(_, rank)| rank == self)
            .map(|(min, _)| *min)
            .unwrap_or_default()
    }
}
