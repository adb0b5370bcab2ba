// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Command-Line Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! `ccsim`: run the trigger/charge Monte-Carlo over one bunch fill.

use anyhow::Context;
use ccsim_core::bunch_fill::BunchFill;
use ccsim_core::charge::{ChargeModel, OverlayGrid};
use ccsim_core::progress::LogProgress;
use ccsim_core::trigger::TriggerSimulator;
use ccsim_diagnostics::report::{emit, emit_density_overlay};
use ccsim_diagnostics::summary::SummaryStats;
use ccsim_math::stats::{mean, median, std_dev};
use ccsim_types::config::SimulationConfig;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "ccsim")]
#[command(about = "Cluster-charge and zero-bias trigger-rate Monte-Carlo over an LHC bunch fill")]
#[command(version)]
struct Args {
    /// JSON configuration; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bunch-fill JSON keyed by bunch-crossing index
    #[arg(short, long, default_value = "data/bx_fill_synthetic.json")]
    bunch_fill: PathBuf,

    /// Directory for plots and summary.json
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Simulate lumisections on the Rayon pool (no orbit progress)
    #[arg(long)]
    parallel: bool,

    /// Also draw N samples and plot them against the model density
    #[arg(long, value_name = "N")]
    sampler_plot: Option<usize>,

    /// Override the run seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the run duration in lumisections
    #[arg(long)]
    lumisections: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(ls) = args.lumisections {
        config.run_duration_ls = ls;
    }
    config.validate()?;

    let charge_model = ChargeModel::from_config(&config.charge)?;
    log::info!("Charge model: {}", charge_model.label());

    if let Some(n) = args.sampler_plot {
        let grid = OverlayGrid::default();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let overlay = charge_model.samples_with_density_overlay(n, &mut rng, grid)?;
        log::info!(
            "Sampler check: {} draws, mean {:.2}, median {:.2}, std dev {:.2}",
            overlay.samples.len(),
            mean(&overlay.samples),
            median(&overlay.samples),
            std_dev(&overlay.samples)
        );
        if let Err(e) = emit_density_overlay(&overlay, (grid.x_min, grid.x_max), &args.output_dir) {
            log::warn!("sampler plot incomplete: {e}");
        }
    }

    let fill = BunchFill::from_path(&args.bunch_fill, config.n_bx_in_orbit)?;
    log::info!(
        "Bunch fill {}: {} / {} non-empty bunch crossings ({:.1} %)",
        args.bunch_fill.display(),
        fill.n_non_empty(),
        fill.len(),
        fill.fraction_non_empty() * 100.0
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::Relaxed);
        })?;
    }

    let sim = TriggerSimulator::new(&config, &fill, &charge_model)?.with_stop_flag(stop);
    log::info!(
        "Running {} LS x {} orbits, mode {:?}, p_trigger = {:.2e}",
        config.run_duration_ls,
        config.orbits_per_ls,
        config.mode,
        sim.p_trigger()
    );

    let mut progress = LogProgress::new(config.run_duration_ls, config.orbits_per_ls);
    let outcome = if args.parallel {
        sim.run_parallel(&mut progress)?
    } else {
        sim.run(&mut progress)?
    };

    let summary = SummaryStats::from_outcome(&outcome, config.bunch_spacing_s);
    println!("\n{summary}\n");

    if let Err(e) = emit(&outcome, &summary, &config.histograms, &args.output_dir) {
        log::warn!("some artifacts were not written: {e}");
    }
    Ok(())
}
