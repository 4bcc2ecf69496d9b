use serde::{Deserialize, Serialize};

use crate::shock::Shock;
use crate::types::{FirmId, Share, clip_unit};

// === CONSTANTS ===

pub const PRODUCTIVITY_FLOOR: f64 = 0.2;
/// Below this effective productivity a firm shuts down for good.
pub const EXIT_THRESHOLD: f64 = 0.25;
pub const WAGE_FLOOR: f64 = 0.4;
pub const HIRING_MIN: f64 = 0.05;
pub const HIRING_MAX: f64 = 0.5;
pub const EMISSIONS_FLOOR: f64 = 0.1;
pub const GREEN_CAPITAL_RATE: f64 = 0.05;
pub const DECISION_NOISE_SD: f64 = 0.02;

// === FIRM ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firm {
    pub id: FirmId,
    /// Structural productivity. Only persistent shocks move it.
    pub productivity: f64,
    /// Effective productivity in the most recent tick.
    pub output: f64,
    pub wage_offer: f64,
    /// Structural share of the household population the firm can employ.
    pub hiring_capacity: Share,
    /// Share it actually hires this tick, after the shock.
    pub hiring_rate: Share,
    pub emissions_intensity: f64,
    pub green_capital: Share,
    pub alive: bool,
}

/// What happened to a firm during its update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmOutcome {
    Operating,
    Exited,
}

impl Firm {
    pub fn new(id: FirmId) -> Self {
        let green_capital = 0.0;
        Self {
            id,
            productivity: 1.0,
            output: 1.0,
            wage_offer: 1.0,
            hiring_capacity: 0.1,
            hiring_rate: 0.1,
            emissions_intensity: emissions_from_green_capital(green_capital),
            green_capital,
            alive: true,
        }
    }

    /// Share of resources put into green capital this tick.
    pub fn decide_green_upgrade(&self, green_subsidy: f64, noise: f64) -> Share {
        let base = 0.15 + 0.2 * self.productivity;
        clip_unit(base + 0.4 * green_subsidy + noise)
    }

    /// Run one tick of firm adjustment. Inactive firms are left untouched.
    ///
    /// A persistent shock compounds into productivity and hiring capacity; a transient
    /// one only scales this tick's output and hiring.
    pub fn adjust(&mut self, shock: &Shock, green_subsidy: f64, noise: f64) -> FirmOutcome {
        if !self.alive {
            return FirmOutcome::Exited;
        }

        let multiplier = shock.multiplier();
        if shock.persistent {
            self.productivity = (self.productivity * multiplier).max(PRODUCTIVITY_FLOOR);
            self.hiring_capacity = clamp_hiring(self.hiring_capacity * multiplier);
            self.output = self.productivity;
            self.hiring_rate = self.hiring_capacity;
        } else {
            self.output = (self.productivity * multiplier).max(PRODUCTIVITY_FLOOR);
            self.hiring_rate = clamp_hiring(self.hiring_capacity * multiplier);
        }

        self.wage_offer = (self.wage_offer * (0.98 + 0.04 * self.output)).max(WAGE_FLOOR);

        let upgrade = self.decide_green_upgrade(green_subsidy, noise);
        self.green_capital = clip_unit(self.green_capital + GREEN_CAPITAL_RATE * upgrade);
        self.emissions_intensity = emissions_from_green_capital(self.green_capital);

        if self.output < EXIT_THRESHOLD {
            self.alive = false;
            return FirmOutcome::Exited;
        }
        FirmOutcome::Operating
    }
}

pub fn clamp_hiring(rate: f64) -> Share {
    if rate.is_nan() {
        HIRING_MIN
    } else {
        rate.clamp(HIRING_MIN, HIRING_MAX)
    }
}

pub fn emissions_from_green_capital(green_capital: Share) -> f64 {
    (1.0 - green_capital).max(EMISSIONS_FLOOR)
}
