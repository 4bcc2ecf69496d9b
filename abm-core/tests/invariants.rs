//! State invariants that must hold after every tick, for any seed and either mechanism.

use abm_core::labor::total_jobs;
use abm_core::{Economy, ModelConfig, Policy};

const SEEDS: [u64; 5] = [1, 7, 42, 1234, 99_999];

fn configs() -> Vec<(&'static str, ModelConfig, Policy)> {
    vec![
        (
            "baseline",
            ModelConfig::default().with_population(120, 15),
            Policy::default(),
        ),
        (
            "network_influence",
            ModelConfig::network_influence().with_population(120, 20),
            Policy::network_influence(),
        ),
    ]
}

#[test]
fn invariant_wealth_and_shares_stay_bounded() {
    for (name, config, policy) in configs() {
        for seed in SEEDS {
            let mut economy = Economy::new(config, policy, seed).unwrap();
            for _ in 0..40 {
                let m = economy.step();
                for h in economy.households() {
                    assert!(h.wealth >= 0.0, "{name}/{seed}: wealth {}", h.wealth);
                    assert!(h.wealth.is_finite());
                    assert!((0.0..=1.0).contains(&h.green_adoption));
                    assert!(h.consumption >= 0.2);
                }
                assert!((0.0..=1.0).contains(&m.unemployment), "{name}/{seed}");
                assert!((0.0..=1.0).contains(&m.gini), "{name}/{seed}");
                assert!((0.0..=1.0).contains(&m.resilience), "{name}/{seed}");
                assert!(m.emissions >= 0.0);
                assert!(m.output >= 0.0);
            }
        }
    }
}

#[test]
fn invariant_green_adoption_never_decreases() {
    for (name, config, policy) in configs() {
        let mut economy = Economy::new(config, policy, 11).unwrap();
        let mut previous: Vec<f64> = economy.households().iter().map(|h| h.green_adoption).collect();
        for _ in 0..30 {
            economy.step();
            for (h, before) in economy.households().iter().zip(&previous) {
                assert!(h.green_adoption >= *before, "{name}: adoption fell for {:?}", h.id);
            }
            previous = economy.households().iter().map(|h| h.green_adoption).collect();
        }
    }
}

#[test]
fn invariant_firm_exit_is_permanent_and_bounds_hold() {
    for (name, config, policy) in configs() {
        for seed in SEEDS {
            let mut economy = Economy::new(config, policy, seed).unwrap();
            let mut was_alive: Vec<bool> = economy.firms().iter().map(|f| f.alive).collect();
            for _ in 0..40 {
                economy.step();
                for (firm, before) in economy.firms().iter().zip(&was_alive) {
                    assert!(!(firm.alive && !before), "{name}/{seed}: firm {:?} revived", firm.id);
                    if firm.alive {
                        assert!(firm.output >= 0.25);
                        assert!(firm.productivity >= 0.2);
                        assert!(firm.wage_offer >= 0.4);
                        assert!((0.05..=0.5).contains(&firm.hiring_rate));
                        assert!((0.1..=1.0).contains(&firm.emissions_intensity));
                        assert!((0.0..=1.0).contains(&firm.green_capital));
                    }
                }
                was_alive = economy.firms().iter().map(|f| f.alive).collect();
            }
        }
    }
}

#[test]
fn invariant_employment_matches_job_count() {
    for (name, config, policy) in configs() {
        for seed in SEEDS {
            let mut economy = Economy::new(config, policy, seed).unwrap();
            for _ in 0..25 {
                let m = economy.step();
                let households = economy.households().len();
                let employed = economy.households().iter().filter(|h| h.employed).count();
                assert_eq!(employed, total_jobs(economy.firms(), households), "{name}/{seed}");
                assert!(employed <= households);

                let expected_rate = (households - employed) as f64 / households as f64;
                assert!((m.unemployment - expected_rate).abs() < 1e-12);
            }
        }
    }
}

#[test]
fn invariant_incomes_come_from_offers_or_safety_net() {
    for (name, config, policy) in configs() {
        let mut economy = Economy::new(config, policy, 5).unwrap();
        for _ in 0..20 {
            economy.step();
            let offers: Vec<f64> = economy
                .firms()
                .iter()
                .filter(|f| f.alive)
                .map(|f| f.wage_offer)
                .collect();
            for h in economy.households() {
                if h.employed {
                    assert!(offers.contains(&h.income), "{name}: wage {} not offered", h.income);
                } else {
                    assert_eq!(h.income, policy.safety_net);
                }
            }
        }
    }
}

#[test]
fn invariant_network_vertex_and_edge_counts_fixed() {
    for rewire_probability in [0.02, 1.0] {
        let mut config = ModelConfig::network_influence().with_population(60, 10);
        if let Some(social) = config.social.as_mut() {
            social.rewire_probability = rewire_probability;
        }
        let policy = Policy::network_influence();
        for seed in SEEDS {
            let mut economy = Economy::new(config, policy, seed).unwrap();
            let edges = economy.network().edge_count();
            assert_eq!(edges, 120);
            for _ in 0..200 {
                economy.step();
                let net = economy.network();
                assert_eq!(net.vertex_count(), 60);
                assert_eq!(net.edge_count(), edges, "p = {rewire_probability}, seed {seed}");
            }
        }
    }
}

#[test]
fn invariant_baseline_network_stays_edgeless() {
    let mut economy = Economy::new(ModelConfig::default(), Policy::default(), 3).unwrap();
    for _ in 0..30 {
        economy.step();
    }
    assert_eq!(economy.network().edge_count(), 0);
    assert_eq!(economy.network().vertex_count(), 200);
}
