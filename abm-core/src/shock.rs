//! Climate shock generation.
//!
//! A shock is a scalar loss fraction for one tick. Positive losses damage output and
//! households; a continuous shock may also be negative (a favourable tick).

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::{ConfigError, ShockModel};

/// The realised shock for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shock {
    /// Fraction of output lost this tick.
    pub loss: f64,
    /// Whether firms carry the shock forward into their structural state.
    pub persistent: bool,
}

impl Shock {
    pub const NONE: Shock = Shock {
        loss: 0.0,
        persistent: false,
    };

    /// Multiplicative factor applied to output and hiring.
    pub fn multiplier(&self) -> f64 {
        1.0 - self.loss
    }

    /// Damage fraction for households; favourable ticks cause no damage.
    pub fn damage_fraction(&self) -> f64 {
        self.loss.max(0.0)
    }
}

/// Pre-built sampler for the configured shock model.
#[derive(Debug, Clone, Copy)]
pub enum ShockSampler {
    Continuous(Normal<f64>),
    Bernoulli { probability: f64, severity: f64 },
}

impl ShockSampler {
    pub fn new(model: &ShockModel) -> Result<Self, ConfigError> {
        model.validate()?;
        Ok(match *model {
            ShockModel::Continuous { std_dev } => ShockSampler::Continuous(
                Normal::new(0.0, std_dev).map_err(|e| ConfigError::Distribution(e.to_string()))?,
            ),
            ShockModel::Bernoulli {
                probability,
                severity,
            } => ShockSampler::Bernoulli {
                probability,
                severity,
            },
        })
    }

    /// Draw this tick's shock. Consumes exactly one value from `rng` in either mode.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Shock {
        match *self {
            ShockSampler::Continuous(normal) => Shock {
                loss: normal.sample(rng),
                persistent: true,
            },
            ShockSampler::Bernoulli {
                probability,
                severity,
            } => {
                let roll: f64 = rng.random();
                Shock {
                    loss: if roll < probability { severity } else { 0.0 },
                    persistent: false,
                }
            }
        }
    }
}
