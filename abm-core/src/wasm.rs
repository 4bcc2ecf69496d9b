use wasm_bindgen::prelude::*;

use crate::config::{ModelConfig, Policy};
use crate::economy::Economy;
use crate::metrics::StepMetrics;

// ============================================================================
// WASM API - Simulation
// ============================================================================

#[wasm_bindgen]
pub struct Simulation {
    economy: Economy,
}

#[wasm_bindgen]
impl Simulation {
    /// Build a simulation. Missing `config` or `policy` fall back to the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: Option<ModelConfig>,
        policy: Option<Policy>,
        seed: u64,
    ) -> Result<Simulation, JsError> {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        let economy = Economy::new(config.unwrap_or_default(), policy.unwrap_or_default(), seed)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self { economy })
    }

    /// Preset with social influence, Bernoulli shocks and progressive redistribution.
    #[wasm_bindgen]
    pub fn network_influence(seed: u64) -> Result<Simulation, JsError> {
        Self::new(
            Some(ModelConfig::network_influence()),
            Some(Policy::network_influence()),
            seed,
        )
    }

    /// Advance one tick and return its metrics
    #[wasm_bindgen]
    pub fn step(&mut self) -> StepMetrics {
        self.economy.step()
    }

    /// Advance `steps` ticks; returns the metrics of the last one
    #[wasm_bindgen]
    pub fn run(&mut self, steps: u32) -> StepMetrics {
        let mut last = self.economy.snapshot();
        for _ in 0..steps {
            last = self.economy.step();
        }
        last
    }

    #[wasm_bindgen]
    pub fn snapshot(&self) -> StepMetrics {
        self.economy.snapshot()
    }

    #[wasm_bindgen]
    pub fn get_tick(&self) -> u64 {
        self.economy.tick()
    }

    #[wasm_bindgen]
    pub fn output_history(&self) -> js_sys::Float64Array {
        js_sys::Float64Array::from(self.economy.output_history())
    }

    #[wasm_bindgen]
    pub fn emissions_history(&self) -> js_sys::Float64Array {
        js_sys::Float64Array::from(self.economy.emissions_history())
    }

    #[wasm_bindgen]
    pub fn config_summary(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.economy.config_summary())
            .map_err(|e| JsError::new(&e.to_string()))
    }
}
