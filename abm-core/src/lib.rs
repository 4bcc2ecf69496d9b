//! Agent-based climate economy.
//!
//! Households and firms interact through a labour market, consumption, carbon policy
//! and optional social influence, under stochastic climate shocks. [`Economy`] runs the
//! model natively; [`Simulation`] wraps it for WASM hosts.

pub mod agents;
pub mod config;
pub mod economy;
pub mod init;
pub mod labor;
pub mod metrics;
pub mod network;
pub mod shock;
pub mod types;
mod wasm;

pub use agents::{Firm, FirmOutcome, Household};
pub use config::{
    ConfigError, ModelConfig, Policy, Redistribution, RunConfig, ShockModel, SocialConfig,
};
pub use economy::Economy;
pub use metrics::{StepMetrics, gini, resilience_index};
pub use network::SocialNetwork;
pub use shock::Shock;
pub use types::*;
pub use wasm::Simulation;

#[cfg(feature = "instrument")]
pub use instrument;
