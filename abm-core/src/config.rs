//! Run configuration: policy levers, population sizes and mechanism selection.
//!
//! Everything here is set once at construction and never mutated by the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tsify_next::Tsify;

// === ERRORS ===

/// Rejected configuration. Fatal to the construction attempt that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("household population must be positive")]
    NoHouseholds,

    #[error("firm population must be positive")]
    NoFirms,

    #[error("{name} must be a finite, non-negative rate (got {value})")]
    NegativeRate { name: &'static str, value: f64 },

    #[error("{name} must lie in [0, 1] (got {value})")]
    OutOfUnitRange { name: &'static str, value: f64 },

    #[error("shock standard deviation must be finite and positive (got {0})")]
    ShockStdDev(f64),

    #[error("mean degree {degree} must be below the household count {households}")]
    MeanDegree { degree: usize, households: usize },

    #[error("invalid distribution parameters: {0}")]
    Distribution(String),

    #[error("malformed run config: {0}")]
    Json(String),
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeRate { name, value })
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

// === POLICY ===

/// Scalar policy levers read by agents and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Policy {
    /// Tax levied per unit of household consumption.
    pub carbon_tax: f64,
    /// Share of collected carbon tax returned as an equal per-capita dividend.
    pub dividend_share: f64,
    /// Income paid to every unemployed household.
    pub safety_net: f64,
    pub green_subsidy: f64,
    /// Rate applied to wealth above the reference level.
    pub progressive_tax: f64,
    /// Rate applied to the shortfall below the reference level.
    pub targeted_transfer: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            carbon_tax: 0.08,
            dividend_share: 0.9,
            safety_net: 0.5,
            green_subsidy: 0.0,
            progressive_tax: 0.0,
            targeted_transfer: 0.0,
        }
    }
}

impl Policy {
    /// Levers used with the network-influence mechanism.
    pub fn network_influence() -> Self {
        Self {
            carbon_tax: 0.08,
            dividend_share: 0.0,
            safety_net: 0.5,
            green_subsidy: 0.25,
            progressive_tax: 0.15,
            targeted_transfer: 0.1,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("carbon_tax", self.carbon_tax)?;
        check_unit("dividend_share", self.dividend_share)?;
        check_rate("safety_net", self.safety_net)?;
        check_rate("green_subsidy", self.green_subsidy)?;
        check_unit("progressive_tax", self.progressive_tax)?;
        check_unit("targeted_transfer", self.targeted_transfer)?;
        Ok(())
    }
}

// === MECHANISMS ===

/// How the per-tick climate shock is generated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum ShockModel {
    /// Normal(0, std_dev) loss every tick, compounding into firm state.
    Continuous { std_dev: f64 },
    /// With `probability`, a loss of `severity` that lasts for the tick only.
    Bernoulli { probability: f64, severity: f64 },
}

impl Default for ShockModel {
    fn default() -> Self {
        ShockModel::Continuous { std_dev: 0.08 }
    }
}

impl ShockModel {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            ShockModel::Continuous { std_dev } => {
                if std_dev.is_finite() && std_dev > 0.0 {
                    Ok(())
                } else {
                    Err(ConfigError::ShockStdDev(std_dev))
                }
            }
            ShockModel::Bernoulli {
                probability,
                severity,
            } => {
                check_unit("shock_probability", probability)?;
                check_unit("shock_severity", severity)
            }
        }
    }
}

/// How tax revenue flows back to households.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Redistribution {
    /// Carbon tax pooled and returned as an equal per-capita dividend.
    #[default]
    CarbonDividend,
    /// Wealth above the population mean is taxed, wealth below it receives a transfer.
    Progressive,
}

/// Peer influence over the household social network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct SocialConfig {
    /// Ring-lattice degree of the initial small-world graph. Odd values round down.
    pub mean_degree: usize,
    /// Per-edge rewiring probability when the graph is built.
    pub small_world_beta: f64,
    /// Per-tick probability that one edge is moved.
    pub rewire_probability: f64,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            mean_degree: 4,
            small_world_beta: 0.1,
            rewire_probability: 0.02,
        }
    }
}

impl SocialConfig {
    pub fn validate(&self, households: usize) -> Result<(), ConfigError> {
        if self.mean_degree >= households.max(1) {
            return Err(ConfigError::MeanDegree {
                degree: self.mean_degree,
                households,
            });
        }
        check_unit("small_world_beta", self.small_world_beta)?;
        check_unit("rewire_probability", self.rewire_probability)
    }
}

// === MODEL CONFIG ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ModelConfig {
    pub households: usize,
    pub firms: usize,
    pub shock: ShockModel,
    pub redistribution: Redistribution,
    /// `None` disables social influence: the network stays edgeless and the signal is 0.
    pub social: Option<SocialConfig>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            households: 200,
            firms: 30,
            shock: ShockModel::default(),
            redistribution: Redistribution::CarbonDividend,
            social: None,
        }
    }
}

impl ModelConfig {
    /// Bernoulli shocks, progressive redistribution and peer influence.
    pub fn network_influence() -> Self {
        Self {
            households: 200,
            firms: 40,
            shock: ShockModel::Bernoulli {
                probability: 0.1,
                severity: 0.4,
            },
            redistribution: Redistribution::Progressive,
            social: Some(SocialConfig::default()),
        }
    }

    pub fn with_population(mut self, households: usize, firms: usize) -> Self {
        self.households = households;
        self.firms = firms;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.households == 0 {
            return Err(ConfigError::NoHouseholds);
        }
        if self.firms == 0 {
            return Err(ConfigError::NoFirms);
        }
        self.shock.validate()?;
        if let Some(social) = &self.social {
            social.validate(self.households)?;
        }
        Ok(())
    }
}

// === RUN RECORD ===

/// Everything needed to reproduce a run. Serialized next to the metrics output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub steps: u64,
    pub seed: u64,
    pub model: ModelConfig,
    pub policy: Policy,
}

impl RunConfig {
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Json(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let run: RunConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        run.model.validate()?;
        run.policy.validate()?;
        Ok(run)
    }
}
