//! The simulation engine.
//!
//! [`Economy`] owns both agent populations, the policy, the social network, the random
//! stream and the output history. [`Economy::step`] advances one tick through a fixed
//! sequence of phases:
//!
//! 1. Climate shock
//! 2. Firm adjustment (productivity, wages, hiring, green capital, exit)
//! 3. Labour market clearing
//! 4. Household green decisions, using the network's social signal
//! 5. Household accounts (consumption, tax, redistribution, damage)
//! 6. Network rewiring (social influence only)
//! 7. Metrics
//!
//! Random draws happen in this order and nowhere else:
//!
//! | phase | draws |
//! |-------|-------|
//! | shock | 1 (normal loss, or Bernoulli roll) |
//! | firms | 1 normal per firm active at the start of the tick, in id order |
//! | labour | 1 index sample + 1 wage pick per employed household, ascending; none if no firm is active |
//! | households | 1 normal per household, in id order |
//! | rewiring | 1 trigger roll; if it fires, 1 edge pick (if any edge) + 2 vertex picks per candidate pair, until an unconnected pair is found |
//!
//! Two engines built from the same seed and configuration therefore produce
//! bit-identical metric sequences.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::agents::firm::DECISION_NOISE_SD as FIRM_NOISE_SD;
use crate::agents::household::DECISION_NOISE_SD as HOUSEHOLD_NOISE_SD;
use crate::agents::{Firm, FirmOutcome, Household};
use crate::config::{ConfigError, ModelConfig, Policy, Redistribution, RunConfig};
use crate::init::{initialize_firms, initialize_households, initialize_network};
use crate::labor::{LaborMarketResult, clear_labor_market};
use crate::metrics::{StepMetrics, gini, mean, resilience_index};
use crate::network::SocialNetwork;
use crate::shock::{Shock, ShockSampler};

#[derive(Debug, Clone)]
pub struct Economy {
    config: ModelConfig,
    policy: Policy,
    households: Vec<Household>,
    firms: Vec<Firm>,
    network: SocialNetwork,
    rng: StdRng,
    shock_sampler: ShockSampler,
    household_noise: Normal<f64>,
    firm_noise: Normal<f64>,
    tick: u64,
    last_shock: Shock,
    output_history: Vec<f64>,
    emissions_history: Vec<f64>,
}

impl Economy {
    /// Build an economy with sampled heterogeneous agents.
    ///
    /// The random stream is seeded once here; agents are drawn first, then the network.
    pub fn new(config: ModelConfig, policy: Policy, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        policy.validate()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let households = initialize_households(config.households, &mut rng)?;
        let firms = initialize_firms(config.firms, &mut rng)?;
        let network = initialize_network(&config, &mut rng);

        Self::assemble(config, policy, households, firms, network, rng)
    }

    pub fn from_run_config(run: &RunConfig) -> Result<Self, ConfigError> {
        Self::new(run.model, run.policy, run.seed)
    }

    /// Build an economy around hand-made agents. Ids must equal positions.
    ///
    /// Behavioural inputs outside [0, 1] are clamped. The network is built from `config`
    /// exactly as in [`Economy::new`], seeded by `seed`.
    pub fn with_agents(
        config: ModelConfig,
        policy: Policy,
        mut households: Vec<Household>,
        firms: Vec<Firm>,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let config = ModelConfig {
            households: households.len(),
            firms: firms.len(),
            ..config
        };
        config.validate()?;
        policy.validate()?;

        for household in &mut households {
            household.clamp_inputs();
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let network = initialize_network(&config, &mut rng);
        Self::assemble(config, policy, households, firms, network, rng)
    }

    fn assemble(
        config: ModelConfig,
        policy: Policy,
        households: Vec<Household>,
        firms: Vec<Firm>,
        network: SocialNetwork,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        let noise = |sd: f64| Normal::new(0.0, sd).map_err(|e| ConfigError::Distribution(e.to_string()));
        Ok(Self {
            shock_sampler: ShockSampler::new(&config.shock)?,
            household_noise: noise(HOUSEHOLD_NOISE_SD)?,
            firm_noise: noise(FIRM_NOISE_SD)?,
            config,
            policy,
            households,
            firms,
            network,
            rng,
            tick: 0,
            last_shock: Shock::NONE,
            output_history: Vec::new(),
            emissions_history: Vec::new(),
        })
    }

    // === Accessors ===

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn households(&self) -> &[Household] {
        &self.households
    }

    pub fn firms(&self) -> &[Firm] {
        &self.firms
    }

    pub fn network(&self) -> &SocialNetwork {
        &self.network
    }

    pub fn output_history(&self) -> &[f64] {
        &self.output_history
    }

    pub fn emissions_history(&self) -> &[f64] {
        &self.emissions_history
    }

    pub fn active_firms(&self) -> usize {
        self.firms.iter().filter(|f| f.alive).count()
    }

    /// Policy and population sizes, for run logs.
    pub fn config_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "policy": self.policy,
            "model": self.config,
            "households": self.households.len(),
            "firms": self.firms.len(),
        })
    }

    // === Simulation Tick ===

    /// Advance one tick and return the resulting metrics. `step` in the result is the
    /// index of the tick just run (0 for the first call).
    pub fn step(&mut self) -> StepMetrics {
        // 1. SHOCK
        let shock = self.shock_sampler.draw(&mut self.rng);
        self.last_shock = shock;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "shock",
            tick = self.tick,
            loss = shock.loss,
            multiplier = shock.multiplier(),
            persistent = shock.persistent,
        );

        // 2. FIRMS
        self.adjust_firms(&shock);

        // 3. LABOUR MARKET
        let labor = clear_labor_market(
            &mut self.households,
            &self.firms,
            self.policy.safety_net,
            &mut self.rng,
        );
        self.log_labor(&labor);

        // 4. HOUSEHOLD DECISIONS
        self.household_decisions();

        // 5. HOUSEHOLD ACCOUNTS
        self.settle_accounts(&shock);

        // 6. NETWORK REWIRING
        self.rewire_network();

        // 7. METRICS
        self.output_history.push(self.aggregate_output());
        self.emissions_history.push(self.total_emissions());
        let metrics = self.compute_metrics(self.tick);
        self.tick += 1;

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "step",
            step = metrics.step,
            households = metrics.households,
            firms = metrics.firms,
            gini = metrics.gini,
            unemployment = metrics.unemployment,
            avg_income = metrics.avg_income,
            avg_consumption_need = metrics.avg_consumption_need,
            avg_consumption = metrics.avg_consumption,
            avg_wealth = metrics.avg_wealth,
            green_adoption = metrics.green_adoption,
            emissions = metrics.emissions,
            emissions_intensity = metrics.emissions_intensity,
            output = metrics.output,
            resilience = metrics.resilience,
            shock = metrics.shock,
        );

        metrics
    }

    /// Metrics for the current state without advancing time.
    pub fn snapshot(&self) -> StepMetrics {
        self.compute_metrics(self.tick)
    }

    pub fn run(&mut self, steps: u64) -> Vec<StepMetrics> {
        (0..steps).map(|_| self.step()).collect()
    }

    // === Phases ===

    fn adjust_firms(&mut self, shock: &Shock) {
        let active = self.active_firms();
        let noise: Vec<f64> = (0..active)
            .map(|_| self.firm_noise.sample(&mut self.rng))
            .collect();

        let subsidy = self.policy.green_subsidy;
        let tick = self.tick;
        for (firm, eps) in self.firms.iter_mut().filter(|f| f.alive).zip(noise) {
            if firm.adjust(shock, subsidy, eps) == FirmOutcome::Exited {
                #[cfg(feature = "instrument")]
                tracing::info!(
                    target: "firm_exit",
                    tick = tick,
                    firm_id = firm.id.0,
                    output = firm.output,
                );
            }
        }
        let _ = tick; // Only read when instrumented
    }

    #[allow(unused_variables)]
    fn log_labor(&self, labor: &LaborMarketResult) {
        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "labor",
            tick = self.tick,
            active_firms = labor.active_firms as u64,
            jobs = labor.jobs as u64,
            employed = labor.employed as u64,
        );
    }

    fn household_decisions(&mut self) {
        let adoption: Vec<f64> = self.households.iter().map(|h| h.green_adoption).collect();
        let signals = if self.config.social.is_some() {
            self.network.social_signals(&adoption)
        } else {
            vec![0.0; adoption.len()]
        };
        let noise: Vec<f64> = (0..self.households.len())
            .map(|_| self.household_noise.sample(&mut self.rng))
            .collect();

        let subsidy = self.policy.green_subsidy;
        for ((household, signal), eps) in self.households.iter_mut().zip(signals).zip(noise) {
            let share = household.decide_green_investment(signal, subsidy, eps);
            household.adopt_green(share);
        }
    }

    fn settle_accounts(&mut self, shock: &Shock) {
        let population = self.households.len() as f64;
        let carbon_tax = self.policy.carbon_tax;

        let consumption: Vec<f64> = self
            .households
            .iter()
            .map(|h| h.planned_consumption(shock))
            .collect();
        let total_tax: f64 = consumption.iter().map(|c| carbon_tax * c).sum();

        let dividend = match self.config.redistribution {
            Redistribution::CarbonDividend => self.policy.dividend_share * total_tax / population,
            Redistribution::Progressive => 0.0,
        };
        let reference = match self.config.redistribution {
            Redistribution::CarbonDividend => None,
            Redistribution::Progressive => Some(mean(self.households.iter().map(|h| h.wealth))),
        };

        for (household, consumed) in self.households.iter_mut().zip(consumption) {
            let tax = carbon_tax * consumed;
            let damage = household.climate_damage(shock);
            let mut flow = household.income - consumed - tax - damage + dividend;
            if let Some(reference) = reference {
                flow -= self.policy.progressive_tax * (household.wealth - reference).max(0.0);
                flow += self.policy.targeted_transfer * (reference - household.wealth).max(0.0);
            }
            household.consumption = consumed;
            household.settle(flow);
        }
    }

    fn rewire_network(&mut self) {
        let Some(social) = self.config.social else {
            return;
        };
        let rewiring = self.network.rewire(social.rewire_probability, &mut self.rng);

        #[cfg(feature = "instrument")]
        if let Some(event) = rewiring {
            tracing::info!(
                target: "rewire",
                tick = self.tick,
                removed = event.removed.is_some(),
                added = event.added.is_some(),
                edges = self.network.edge_count() as u64,
            );
        }
        let _ = rewiring; // Suppress unused warning when feature disabled
    }

    // === Aggregates ===

    fn employed_count(&self) -> usize {
        self.households.iter().filter(|h| h.employed).count()
    }

    /// Mean effective productivity of active firms times employed households.
    pub fn aggregate_output(&self) -> f64 {
        let active: Vec<&Firm> = self.firms.iter().filter(|f| f.alive).collect();
        if active.is_empty() {
            return 0.0;
        }
        mean(active.iter().map(|f| f.output)) * self.employed_count() as f64
    }

    /// Household consumption not covered by green adoption, plus firm production emissions.
    pub fn total_emissions(&self) -> f64 {
        let household: f64 = self
            .households
            .iter()
            .map(|h| h.consumption * (1.0 - h.green_adoption))
            .sum();
        let production: f64 = self
            .firms
            .iter()
            .filter(|f| f.alive)
            .map(|f| f.emissions_intensity * f.output)
            .sum();
        (household + production).max(0.0)
    }

    fn compute_metrics(&self, step: u64) -> StepMetrics {
        let population = self.households.len() as f64;
        let wealth: Vec<f64> = self.households.iter().map(|h| h.wealth).collect();
        let unemployed = self.households.iter().filter(|h| !h.employed).count();

        StepMetrics {
            step: step as f64,
            households: population,
            firms: self.active_firms() as f64,
            gini: gini(&wealth),
            unemployment: unemployed as f64 / population,
            avg_income: mean(self.households.iter().map(|h| h.income)),
            avg_consumption_need: mean(self.households.iter().map(|h| h.consumption_need)),
            avg_consumption: mean(self.households.iter().map(|h| h.consumption)),
            avg_wealth: mean(wealth.iter().copied()),
            green_adoption: mean(self.households.iter().map(|h| h.green_adoption)),
            emissions: self.total_emissions() / population,
            emissions_intensity: mean(
                self.firms
                    .iter()
                    .filter(|f| f.alive)
                    .map(|f| f.emissions_intensity),
            ),
            output: self.aggregate_output(),
            resilience: resilience_index(&self.output_history),
            shock: self.last_shock.loss,
        }
    }
}
