// Core ID types and type aliases

use serde::{Deserialize, Serialize};

// === TYPE ALIASES ===

pub type Wealth = f64;
pub type Share = f64;

// === NEWTYPE IDS ===

/// Stable household identifier. Doubles as the household's vertex in the social network.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct HouseholdId(pub u32);

impl HouseholdId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FirmId(pub u32);

impl FirmId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Clamp a behavioural quantity into [0, 1]. NaN collapses to 0.
pub fn clip_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_unit_bounds() {
        assert_eq!(clip_unit(-0.3), 0.0);
        assert_eq!(clip_unit(0.4), 0.4);
        assert_eq!(clip_unit(1.7), 1.0);
        assert_eq!(clip_unit(f64::NAN), 0.0);
    }
}
