//! The engine's tracing events, captured into tables through the instrument crate.

#![cfg(feature = "instrument")]

use abm_core::instrument::{self, ColumnData, RunRecorder, TableSubscriber};
use abm_core::{Economy, ModelConfig, Policy};
use tracing::subscriber::with_default;

#[test]
fn every_tick_emits_shock_labor_and_step_rows() {
    instrument::clear();
    let mut economy = Economy::new(ModelConfig::default(), Policy::default(), 42).unwrap();
    let metrics = with_default(TableSubscriber, || economy.run(20));
    let recorder = instrument::drain();

    for target in ["shock", "labor", "step"] {
        let table = recorder.table(target).unwrap_or_else(|| panic!("missing {target}"));
        assert_eq!(table.rows, 20, "{target}");
    }

    let step = recorder.table("step").unwrap();
    let steps = step.column("step").and_then(ColumnData::as_f64).unwrap();
    assert_eq!(steps, (0..20).map(|i| i as f64).collect::<Vec<_>>().as_slice());

    let gini = step.column("gini").and_then(ColumnData::as_f64).unwrap();
    for (recorded, m) in gini.iter().zip(&metrics) {
        assert_eq!(*recorded, m.gini);
    }

    let labor = recorder.table("labor").unwrap();
    let employed = labor.column("employed").and_then(ColumnData::as_u64).unwrap();
    for (count, m) in employed.iter().zip(&metrics) {
        let rate = 1.0 - *count as f64 / 200.0;
        assert!((rate - m.unemployment).abs() < 1e-12);
    }
}

#[test]
fn firm_exits_are_logged_once() {
    instrument::clear();
    let mut economy = Economy::new(
        ModelConfig::network_influence().with_population(100, 30),
        Policy::network_influence(),
        3,
    )
    .unwrap();
    with_default(TableSubscriber, || economy.run(60));
    let recorder = instrument::drain();

    let exited = economy.firms().iter().filter(|f| !f.alive).count();
    let logged = recorder.table("firm_exit").map_or(0, |t| t.rows);
    assert_eq!(logged, exited);

    if let Some(rewire) = recorder.table("rewire") {
        let edges = rewire.column("edges").and_then(ColumnData::as_u64).unwrap();
        assert_eq!(*edges.last().unwrap() as usize, economy.network().edge_count());
    }
}

#[test]
fn step_table_converts_to_dataframe() {
    instrument::clear();
    let mut economy = Economy::new(ModelConfig::default().with_population(50, 5), Policy::default(), 8)
        .unwrap();
    with_default(TableSubscriber, || economy.run(12));
    let recorder = instrument::drain();

    let df = recorder.table("step").unwrap().to_dataframe().unwrap();
    assert_eq!(df.height(), 12);
    assert_eq!(df.width(), 15);
    assert!(df.column("resilience").is_ok());
}

#[test]
fn run_recorder_persists_a_run() {
    let parent = std::env::temp_dir().join(format!("abm_runs_{}", std::process::id()));
    let dir = {
        let mut run = RunRecorder::new(&parent, "baseline seed 42");
        let mut economy = Economy::new(ModelConfig::default().with_population(40, 6), Policy::default(), 42)
            .unwrap();
        with_default(TableSubscriber, || economy.run(10));
        assert_eq!(run.get()["step"].height(), 10);
        run.run_dir().to_path_buf()
    };

    assert!(dir.ends_with("baseline_seed_42"));
    for file in ["step.parquet", "step.csv", "shock.parquet", "labor.csv", "_ready"] {
        assert!(dir.join(file).exists(), "missing {file}");
    }
    let _ = std::fs::remove_dir_all(&parent);
}
