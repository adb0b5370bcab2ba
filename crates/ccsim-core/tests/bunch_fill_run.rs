// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Bunch-Fill Run Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Runs over the bundled synthetic bunch fill.

use ccsim_core::bunch_fill::BunchFill;
use ccsim_core::charge::ChargeModel;
use ccsim_core::progress::NoProgress;
use ccsim_core::trigger::TriggerSimulator;
use ccsim_types::config::{RunMode, SimulationConfig};
use ccsim_types::constants::N_BX_IN_ORBIT;

const FILL: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/bx_fill_synthetic.json");

#[test]
fn bundled_fill_loads() {
    let fill = BunchFill::from_path(FILL, N_BX_IN_ORBIT).unwrap();
    assert_eq!(fill.len(), N_BX_IN_ORBIT);
    assert_eq!(fill.n_non_empty(), 2496);
    let slots = fill.non_empty_slots();
    assert_eq!(slots[0].index, 60);
    assert!(slots.iter().all(|s| s.lumi > 0.0));
}

#[test]
fn bundled_fill_default_probability() {
    let cfg = SimulationConfig::default();
    let fill = BunchFill::from_path(FILL, cfg.n_bx_in_orbit).unwrap();
    let model = ChargeModel::from_config(&cfg.charge).unwrap();
    let sim = TriggerSimulator::new(&cfg, &fill, &model).unwrap();
    assert_eq!(sim.p_trigger(), 20.0 / (1024.0 * 2496.0));
}

#[test]
fn bundled_fill_charge_run() {
    let cfg = SimulationConfig {
        orbits_per_ls: 16,
        mode: RunMode::Both,
        ..SimulationConfig::default()
    };
    let fill = BunchFill::from_path(FILL, cfg.n_bx_in_orbit).unwrap();
    let model = ChargeModel::from_config(&cfg.charge).unwrap();
    let out = TriggerSimulator::new(&cfg, &fill, &model)
        .unwrap()
        .run(&mut NoProgress)
        .unwrap();

    let hists = out.charge.unwrap();
    assert_eq!(hists.samples(), 16 * 2496);
    assert_eq!(hists.charge_vs_bx.entries(), hists.charge.entries());
    assert!((hists.charge.mean() - 150.0).abs() < 1.0);

    // Abort gap at the end of the orbit stays empty.
    let tail = hists.charge_vs_bx.counts.slice(ndarray::s![3450..3600, ..]);
    assert_eq!(tail.sum(), 0);
}
