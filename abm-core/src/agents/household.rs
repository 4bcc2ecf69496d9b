use serde::{Deserialize, Serialize};

use crate::shock::Shock;
use crate::types::{HouseholdId, Share, Wealth, clip_unit};

// === CONSTANTS ===

pub const BASE_PROPENSITY: f64 = 0.2;
pub const SKILL_WEIGHT: f64 = 0.4;
pub const SOCIAL_WEIGHT: f64 = 0.3;
pub const SUBSIDY_WEIGHT: f64 = 0.4;
pub const DECISION_NOISE_SD: f64 = 0.03;
/// Fraction of the chosen investment share that turns into adoption each tick.
pub const ADOPTION_RATE: f64 = 0.05;
pub const MIN_CONSUMPTION: f64 = 0.2;

// === HOUSEHOLD ===

/// A household: sells labour, consumes, pays tax and slowly adopts green technology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub wealth: Wealth,
    pub income: f64,
    /// Baseline consumption requirement per tick.
    pub consumption_need: f64,
    pub risk_tolerance: f64,
    pub skill: f64,
    pub green_adoption: Share,
    /// Fixed fraction of a climate loss that lands on this household.
    pub shock_exposure: f64,
    /// Recomputed by the labour market every tick.
    pub employed: bool,
    /// Consumption in the most recent tick (0 before the first).
    pub consumption: f64,
}

impl Household {
    pub fn new(id: HouseholdId) -> Self {
        Self {
            id,
            wealth: 1.0,
            income: 1.0,
            consumption_need: 1.0,
            risk_tolerance: 0.5,
            skill: 0.5,
            green_adoption: 0.0,
            shock_exposure: 0.5,
            employed: true,
            consumption: 0.0,
        }
    }

    pub fn with_wealth(mut self, wealth: Wealth) -> Self {
        self.wealth = wealth.max(0.0);
        self
    }

    /// Clamp behavioural inputs into [0, 1] and wealth to a finite non-negative value.
    pub fn clamp_inputs(&mut self) {
        self.risk_tolerance = clip_unit(self.risk_tolerance);
        self.skill = clip_unit(self.skill);
        self.green_adoption = clip_unit(self.green_adoption);
        self.shock_exposure = clip_unit(self.shock_exposure);
        self.settle(0.0);
    }

    /// Share of resources the household wants to put into green technology.
    ///
    /// `noise` is drawn by the engine so that draw order stays independent of
    /// evaluation order.
    pub fn decide_green_investment(&self, social_signal: f64, green_subsidy: f64, noise: f64) -> Share {
        let base = BASE_PROPENSITY + SKILL_WEIGHT * self.skill;
        let decision =
            base + SOCIAL_WEIGHT * social_signal + SUBSIDY_WEIGHT * green_subsidy + noise;
        clip_unit(decision)
    }

    pub fn adopt_green(&mut self, investment_share: Share) {
        self.green_adoption = clip_unit(self.green_adoption + ADOPTION_RATE * investment_share);
    }

    /// Consumption this tick: a risk-weighted slice of need, trimmed when the shock bites.
    pub fn planned_consumption(&self, shock: &Shock) -> f64 {
        let baseline = self.consumption_need * (1.0 - 0.5 * shock.loss);
        (baseline * (0.6 + 0.6 * self.risk_tolerance)).max(MIN_CONSUMPTION)
    }

    pub fn climate_damage(&self, shock: &Shock) -> f64 {
        self.shock_exposure * shock.damage_fraction()
    }

    /// Apply a net flow to wealth. Losses beyond current wealth are written off.
    pub fn settle(&mut self, net_flow: f64) {
        let next = self.wealth + net_flow;
        self.wealth = if next.is_finite() { next.max(0.0) } else { 0.0 };
    }
}
