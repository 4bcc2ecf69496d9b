//! Sampling of the initial agent populations and social network.

use rand::Rng;
use rand_distr::{Beta, Distribution, LogNormal, Uniform};

use crate::agents::firm::{clamp_hiring, emissions_from_green_capital};
use crate::agents::{Firm, Household};
use crate::config::{ConfigError, ModelConfig};
use crate::network::SocialNetwork;
use crate::types::{FirmId, HouseholdId};

fn distribution_error(e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Distribution(e.to_string())
}

fn uniform(low: f64, high: f64) -> Result<Uniform<f64>, ConfigError> {
    Uniform::new(low, high).map_err(distribution_error)
}

/// Heterogeneous households. Per household, in id order: wealth, consumption need,
/// risk tolerance, skill, green adoption, shock exposure.
pub fn initialize_households<R: Rng>(
    count: usize,
    rng: &mut R,
) -> Result<Vec<Household>, ConfigError> {
    let wealth = LogNormal::new(0.0, 0.5).map_err(distribution_error)?;
    let need = uniform(0.8, 1.2)?;
    let risk = uniform(0.3, 0.9)?;
    let skill = Beta::new(2.0, 3.0).map_err(distribution_error)?;
    let adoption = uniform(0.0, 0.2)?;
    let exposure = uniform(0.2, 0.8)?;

    let households = (0..count)
        .map(|i| {
            let mut h = Household::new(HouseholdId::new(i as u32)).with_wealth(wealth.sample(rng));
            h.consumption_need = need.sample(rng);
            h.risk_tolerance = risk.sample(rng);
            h.skill = skill.sample(rng);
            h.green_adoption = adoption.sample(rng);
            h.shock_exposure = exposure.sample(rng);
            h
        })
        .collect();
    Ok(households)
}

/// Heterogeneous firms. Per firm, in id order: productivity, wage offer, hiring
/// capacity, green capital.
pub fn initialize_firms<R: Rng>(count: usize, rng: &mut R) -> Result<Vec<Firm>, ConfigError> {
    let productivity = uniform(0.8, 1.3)?;
    let wage = uniform(0.9, 1.3)?;
    let hiring = uniform(0.08, 0.18)?;
    let green = uniform(0.0, 0.3)?;

    let firms = (0..count)
        .map(|i| {
            let mut f = Firm::new(FirmId::new(i as u32));
            f.productivity = productivity.sample(rng);
            f.output = f.productivity;
            f.wage_offer = wage.sample(rng);
            f.hiring_capacity = clamp_hiring(hiring.sample(rng));
            f.hiring_rate = f.hiring_capacity;
            f.green_capital = green.sample(rng);
            f.emissions_intensity = emissions_from_green_capital(f.green_capital);
            f
        })
        .collect();
    Ok(firms)
}

pub fn initialize_network<R: Rng>(config: &ModelConfig, rng: &mut R) -> SocialNetwork {
    match &config.social {
        Some(social) => SocialNetwork::small_world(
            config.households,
            social.mean_degree,
            social.small_world_beta,
            rng,
        ),
        None => SocialNetwork::edgeless(config.households),
    }
}
