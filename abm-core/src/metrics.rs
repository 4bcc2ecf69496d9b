//! Aggregate statistics over population state.
//!
//! Everything here is a pure function of its inputs. The engine assembles the results
//! into a [`StepMetrics`] every tick.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

/// Floor used wherever a metric divides by an aggregate that may collapse to zero.
pub const DIVISION_FLOOR: f64 = 1e-6;

/// Values whose absolute magnitude is below this are treated as zero by [`gini`].
const ZERO_TOLERANCE: f64 = 1e-12;

/// Minimum history length before resilience is assessed.
pub const RESILIENCE_MIN_HISTORY: usize = 3;

// === SCALAR HELPERS ===

pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Finite, non-negative entries sorted ascending.
fn sorted_non_negative(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

// === INEQUALITY ===

/// Gini coefficient via the rank-weighted sum.
///
/// `G = 2 * sum(rank_i * x_i) / (n * sum(x)) - (n + 1) / n` over the ascending,
/// non-negative entries (ranks from 1). Returns 0 for an empty or all-zero input.
pub fn gini(values: &[f64]) -> f64 {
    let sorted = sorted_non_negative(values);
    let n = sorted.len();
    let total: f64 = sorted.iter().sum();
    if n == 0 || total <= ZERO_TOLERANCE {
        return 0.0;
    }

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, v)| (i + 1) as f64 * v)
        .sum();
    let n = n as f64;
    (2.0 * weighted / (n * total) - (n + 1.0) / n).clamp(0.0, 1.0)
}

/// Gini coefficient from the Lorenz curve: `(n + 1 - 2 * sum(cumulative_share)) / n`.
///
/// Algebraically identical to [`gini`]; kept as an independent cross-check.
pub fn gini_lorenz(values: &[f64]) -> f64 {
    let sorted = sorted_non_negative(values);
    let n = sorted.len();
    let total: f64 = sorted.iter().sum();
    if n == 0 || total <= ZERO_TOLERANCE {
        return 0.0;
    }

    let mut running = 0.0;
    let mut cumulative_shares = 0.0;
    for v in &sorted {
        running += v;
        cumulative_shares += running / total;
    }
    let n = n as f64;
    ((n + 1.0 - 2.0 * cumulative_shares) / n).clamp(0.0, 1.0)
}

// === RESILIENCE ===

/// Latest output relative to the historical peak, clipped to [0, 1].
///
/// Histories shorter than [`RESILIENCE_MIN_HISTORY`] carry too little information
/// and score 0.
pub fn resilience_index(output_history: &[f64]) -> f64 {
    if output_history.len() < RESILIENCE_MIN_HISTORY {
        return 0.0;
    }
    let peak = output_history
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    let last = output_history[output_history.len() - 1];
    let ratio = last / peak.max(DIVISION_FLOOR);
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// === STEP METRICS ===

/// Snapshot of aggregate state after one tick. Collaborators read it as flat
/// key/value data via [`StepMetrics::to_map`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct StepMetrics {
    pub step: f64,
    pub households: f64,
    /// Active firms.
    pub firms: f64,
    pub gini: f64,
    pub unemployment: f64,
    pub avg_income: f64,
    pub avg_consumption_need: f64,
    pub avg_consumption: f64,
    pub avg_wealth: f64,
    pub green_adoption: f64,
    /// Emissions per capita.
    pub emissions: f64,
    /// Mean emissions intensity of active firms.
    pub emissions_intensity: f64,
    pub output: f64,
    pub resilience: f64,
    /// Loss fraction of the tick's climate shock.
    pub shock: f64,
}

impl StepMetrics {
    pub const KEYS: [&'static str; 15] = [
        "step",
        "households",
        "firms",
        "gini",
        "unemployment",
        "avg_income",
        "avg_consumption_need",
        "avg_consumption",
        "avg_wealth",
        "green_adoption",
        "emissions",
        "emissions_intensity",
        "output",
        "resilience",
        "shock",
    ];

    fn values(&self) -> [f64; 15] {
        [
            self.step,
            self.households,
            self.firms,
            self.gini,
            self.unemployment,
            self.avg_income,
            self.avg_consumption_need,
            self.avg_consumption,
            self.avg_wealth,
            self.green_adoption,
            self.emissions,
            self.emissions_intensity,
            self.output,
            self.resilience,
            self.shock,
        ]
    }

    /// Key/value pairs in [`StepMetrics::KEYS`] order.
    pub fn to_map(&self) -> Vec<(&'static str, f64)> {
        Self::KEYS.iter().copied().zip(self.values()).collect()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        Self::KEYS
            .iter()
            .position(|k| *k == key)
            .map(|i| self.values()[i])
    }
}
