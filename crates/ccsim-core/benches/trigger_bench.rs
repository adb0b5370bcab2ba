// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Trigger Simulator Benchmark
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use ccsim_core::bunch_fill::BunchFill;
use ccsim_core::charge::ChargeModel;
use ccsim_core::progress::NoProgress;
use ccsim_core::trigger::TriggerSimulator;
use ccsim_types::config::{RunMode, SimulationConfig};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

/// 2808-bunch-like fill: 72-bunch trains separated by 8-slot gaps.
fn train_fill(n_bx: usize) -> BunchFill {
    let lumi = (0..n_bx)
        .map(|i| if i % 80 < 72 { 1.0 } else { 0.0 })
        .collect();
    BunchFill::from_lumi(lumi).expect("finite fill")
}

fn bench_lumisection(c: &mut Criterion) {
    let mut group = c.benchmark_group("lumisection");
    group.sample_size(10);
    for mode in [RunMode::TriggerCount, RunMode::ChargeHistogram] {
        let cfg = SimulationConfig {
            orbits_per_ls: 64,
            mode,
            ..SimulationConfig::default()
        };
        let fill = train_fill(cfg.n_bx_in_orbit);
        let model = ChargeModel::from_config(&cfg.charge).expect("default charge model");
        let sim = TriggerSimulator::new(&cfg, &fill, &model).expect("valid simulator");
        group.bench_function(format!("{mode:?}_64_orbits"), |b| {
            b.iter(|| black_box(sim.run(&mut NoProgress).expect("run")))
        });
    }
    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let cfg = SimulationConfig {
        run_duration_ls: 8,
        orbits_per_ls: 32,
        mode: RunMode::Both,
        ..SimulationConfig::default()
    };
    let fill = train_fill(cfg.n_bx_in_orbit);
    let model = ChargeModel::from_config(&cfg.charge).expect("default charge model");
    let sim = TriggerSimulator::new(&cfg, &fill, &model).expect("valid simulator");

    let mut group = c.benchmark_group("run_8_ls");
    group.sample_size(10);
    group.bench_function("sequential", |b| {
        b.iter(|| black_box(sim.run(&mut NoProgress).expect("run")))
    });
    group.bench_function("parallel", |b| {
        b.iter(|| black_box(sim.run_parallel(&mut NoProgress).expect("run")))
    });
    group.finish();
}

criterion_group!(benches, bench_lumisection, bench_parallel);
criterion_main!(benches);
