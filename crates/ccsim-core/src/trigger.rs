// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Trigger Simulator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Lumisection × orbit × non-empty-crossing Monte-Carlo loop.
//!
//! Every lumisection owns two random streams (trigger decisions and charge
//! samples) seeded from the run seed and the lumisection index. Partial
//! tallies are merged in lumisection order, so the sequential and the
//! Rayon-parallel paths give bit-identical results.

use crate::bunch_fill::{BunchCrossingSlot, BunchFill};
use crate::charge::ChargeModel;
use crate::histogram::ChargeHistograms;
use crate::progress::{NoProgress, ProgressObserver, ProgressSchedule};
use ccsim_types::config::{RunMode, SimulationConfig, TriggerWeighting};
use ccsim_types::error::{SimError, SimResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const TRIGGER_STREAM: u64 = 0;
const CHARGE_STREAM: u64 = 1;

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of one random stream of one lumisection.
pub fn stream_seed(run_seed: u64, lumisection: u32, stream: u64) -> u64 {
    splitmix64(run_seed ^ splitmix64(((lumisection as u64) << 8) | stream))
}

/// Uniform per-crossing, per-orbit trigger probability.
///
/// `p = target_rate / (orbits_per_ls * n_non_empty)`, so that the expected
/// number of triggers per lumisection equals `target_rate`.
pub fn trigger_probability(target_rate: f64, orbits_per_ls: u32, n_non_empty: usize) -> SimResult<f64> {
    if n_non_empty == 0 {
        return Err(SimError::InvalidRate(
            "bunch fill has no non-empty bunch crossings".to_string(),
        ));
    }
    if orbits_per_ls == 0 {
        return Err(SimError::InvalidRate("orbits_per_ls must be > 0".to_string()));
    }
    if !target_rate.is_finite() || target_rate < 0.0 {
        return Err(SimError::InvalidRate(format!(
            "target trigger rate must be finite and >= 0, got {target_rate}"
        )));
    }
    let p = target_rate / (orbits_per_ls as f64 * n_non_empty as f64);
    if p > 1.0 {
        return Err(SimError::InvalidRate(format!(
            "target rate {target_rate} unreachable with {orbits_per_ls} orbits x {n_non_empty} \
             non-empty crossings (p = {p})"
        )));
    }
    Ok(p)
}

/// Per-slot probabilities proportional to each slot's luminosity.
/// Their sum over one orbit equals that of the uniform model.
pub fn weighted_trigger_probabilities(
    target_rate: f64,
    orbits_per_ls: u32,
    slots: &[BunchCrossingSlot],
) -> SimResult<Vec<f64>> {
    let p_mean = trigger_probability(target_rate, orbits_per_ls, slots.len())?;
    let mean_lumi = slots.iter().map(|s| s.lumi).sum::<f64>() / slots.len() as f64;
    let probs: Vec<f64> = slots.iter().map(|s| p_mean * s.lumi / mean_lumi).collect();
    if let Some((slot, p)) = slots.iter().zip(&probs).find(|(_, &p)| p > 1.0) {
        return Err(SimError::InvalidRate(format!(
            "bx {} would need trigger probability {p} > 1",
            slot.index
        )));
    }
    Ok(probs)
}

/// Aggregates of one or more lumisections.
#[derive(Debug, Clone, PartialEq)]
pub struct LumisectionTally {
    pub triggered: u64,
    pub non_empty_trials: u64,
    pub charge: Option<ChargeHistograms>,
}

impl LumisectionTally {
    pub fn merge(&mut self, other: &LumisectionTally) -> SimResult<()> {
        self.triggered += other.triggered;
        self.non_empty_trials += other.non_empty_trials;
        match (&mut self.charge, &other.charge) {
            (Some(a), Some(b)) => a.merge(b),
            (None, None) => Ok(()),
            _ => Err(SimError::InvalidConfig(
                "cannot merge tallies from different run modes".to_string(),
            )),
        }
    }
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub mode: RunMode,
    pub weighting: TriggerWeighting,
    pub run_duration_ls: u32,
    pub orbits_per_ls: u32,
    pub n_bx_in_orbit: usize,
    pub n_non_empty: usize,
    pub target_trigger_rate: f64,
    /// Per-crossing probability; the mean over non-empty crossings when weighted.
    pub p_trigger: f64,
    /// Trigger count; `None` when the mode does not count triggers.
    pub triggered: Option<u64>,
    pub non_empty_trials: u64,
    pub charge: Option<ChargeHistograms>,
    pub elapsed: Duration,
}

impl SimulationOutcome {
    /// All crossings of the run, empty ones included.
    pub fn total_crossings(&self) -> u64 {
        self.run_duration_ls as u64 * self.orbits_per_ls as u64 * self.n_bx_in_orbit as u64
    }

    pub fn fraction_non_empty(&self) -> f64 {
        self.n_non_empty as f64 / self.n_bx_in_orbit as f64
    }

    /// Triggers per crossing, empty crossings included.
    pub fn observed_rate(&self) -> Option<f64> {
        let n = self.triggered?;
        Some(n as f64 / self.total_crossings() as f64)
    }

    /// Expected value of `observed_rate`: `p_trigger * fraction_non_empty`.
    pub fn expected_rate(&self) -> f64 {
        self.p_trigger * self.fraction_non_empty()
    }

    /// Observed triggers per lumisection, comparable to `target_trigger_rate`.
    pub fn observed_triggers_per_ls(&self) -> Option<f64> {
        Some(self.observed_rate()? * self.orbits_per_ls as f64 * self.n_bx_in_orbit as f64)
    }
}

/// Runs the nested lumisection/orbit/crossing loop over a fixed bunch fill.
pub struct TriggerSimulator<'a> {
    config: &'a SimulationConfig,
    charge_model: &'a ChargeModel,
    slots: Vec<BunchCrossingSlot>,
    probabilities: Vec<f64>,
    p_trigger: f64,
    schedule: ProgressSchedule,
    stop: Option<Arc<AtomicBool>>,
    parallel_chunk: Option<usize>,
}

impl<'a> TriggerSimulator<'a> {
    /// Validate the configuration and derive the trigger probabilities.
    pub fn new(
        config: &'a SimulationConfig,
        fill: &BunchFill,
        charge_model: &'a ChargeModel,
    ) -> SimResult<Self> {
        config.validate()?;
        if fill.len() != config.n_bx_in_orbit {
            return Err(SimError::InvalidConfig(format!(
                "bunch fill has {} slots but the orbit has {} bunch crossings",
                fill.len(),
                config.n_bx_in_orbit
            )));
        }

        let slots = fill.non_empty_slots();
        let p_trigger =
            trigger_probability(config.target_trigger_rate, config.orbits_per_ls, slots.len())?;
        let probabilities = match config.weighting {
            TriggerWeighting::Uniform => vec![p_trigger; slots.len()],
            TriggerWeighting::LuminosityWeighted => weighted_trigger_probabilities(
                config.target_trigger_rate,
                config.orbits_per_ls,
                &slots,
            )?,
        };

        log::warn!(
            "HIP recovery model not implemented: tau = {} ns, p_hip = {} are ignored",
            config.hip.recovery_time_constant_ns,
            config.hip.probability
        );
        log::debug!(
            "init_lumi = {}, p_mip = {} are carried but not used",
            config.init_lumi,
            config.p_mip
        );

        Ok(TriggerSimulator {
            config,
            charge_model,
            slots,
            probabilities,
            p_trigger,
            schedule: ProgressSchedule::new(config.orbits_per_ls, config.progress.orbit_divisor),
            stop: None,
            parallel_chunk: None,
        })
    }

    /// Stop cleanly at the next lumisection boundary once `flag` is set.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    /// Lumisections simulated concurrently by `run_parallel`; defaults to the
    /// Rayon pool size. Bounds the number of per-lumisection tallies alive at once.
    pub fn with_parallel_chunk(mut self, lumisections: usize) -> Self {
        self.parallel_chunk = Some(lumisections.max(1));
        self
    }

    pub fn p_trigger(&self) -> f64 {
        self.p_trigger
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn slots(&self) -> &[BunchCrossingSlot] {
        &self.slots
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn empty_tally(&self) -> SimResult<LumisectionTally> {
        let charge = if self.config.mode.fills_charge() {
            Some(ChargeHistograms::new(&self.config.histograms)?)
        } else {
            None
        };
        Ok(LumisectionTally {
            triggered: 0,
            non_empty_trials: 0,
            charge,
        })
    }

    /// Simulate one lumisection from its own seeded streams.
    pub fn simulate_lumisection(
        &self,
        lumisection: u32,
        observer: &mut dyn ProgressObserver,
        start: Instant,
    ) -> SimResult<LumisectionTally> {
        let seed = self.config.seed;
        let mut trigger_rng = StdRng::seed_from_u64(stream_seed(seed, lumisection, TRIGGER_STREAM));
        let mut charge_rng = StdRng::seed_from_u64(stream_seed(seed, lumisection, CHARGE_STREAM));

        let counts_triggers = self.config.mode.counts_triggers();
        let mut tally = self.empty_tally()?;
        let mut charges = Vec::with_capacity(self.slots.len());

        for orbit in 0..self.config.orbits_per_ls {
            if self.schedule.is_orbit_checkpoint(orbit) {
                observer.on_progress(lumisection, orbit, start.elapsed());
            }

            if counts_triggers {
                for &p in &self.probabilities {
                    if trigger_rng.gen::<f64>() < p {
                        tally.triggered += 1;
                    }
                }
            }

            if let Some(hists) = tally.charge.as_mut() {
                self.charge_model
                    .sample_into(self.slots.len(), &mut charge_rng, &mut charges);
                for (slot, &q) in self.slots.iter().zip(&charges) {
                    hists.fill(slot.index, q);
                }
            }

            tally.non_empty_trials += self.slots.len() as u64;
        }
        Ok(tally)
    }

    fn outcome(&self, total: LumisectionTally, elapsed: Duration) -> SimulationOutcome {
        SimulationOutcome {
            mode: self.config.mode,
            weighting: self.config.weighting,
            run_duration_ls: self.config.run_duration_ls,
            orbits_per_ls: self.config.orbits_per_ls,
            n_bx_in_orbit: self.config.n_bx_in_orbit,
            n_non_empty: self.slots.len(),
            target_trigger_rate: self.config.target_trigger_rate,
            p_trigger: self.p_trigger,
            triggered: self.config.mode.counts_triggers().then_some(total.triggered),
            non_empty_trials: total.non_empty_trials,
            charge: total.charge,
            elapsed,
        }
    }

    /// Sequential run with progress checkpoints.
    pub fn run(&self, observer: &mut dyn ProgressObserver) -> SimResult<SimulationOutcome> {
        let start = Instant::now();
        let requested = self.config.run_duration_ls;
        let mut total = self.empty_tally()?;

        for ls in 0..requested {
            if self.stop_requested() {
                return Err(SimError::Interrupted {
                    completed_ls: ls,
                    requested_ls: requested,
                });
            }
            if ProgressSchedule::is_lumisection_checkpoint(ls) {
                observer.on_lumisection(ls, start.elapsed());
            }
            let tally = self.simulate_lumisection(ls, observer, start)?;
            log::debug!("LS {}: {} triggers", ls + 1, tally.triggered);
            total.merge(&tally)?;
            observer.on_lumisection_done(ls, start.elapsed());
        }

        Ok(self.outcome(total, start.elapsed()))
    }

    /// Lumisections in parallel on the Rayon pool, one chunk at a time.
    ///
    /// Each chunk is folded into the total in lumisection order before the
    /// next starts, so memory stays bounded by the chunk size and the result
    /// is bit-identical to `run`. Only `on_lumisection_done` is reported.
    pub fn run_parallel(&self, observer: &mut dyn ProgressObserver) -> SimResult<SimulationOutcome> {
        let start = Instant::now();
        let requested = self.config.run_duration_ls;
        let chunk = self
            .parallel_chunk
            .unwrap_or_else(rayon::current_num_threads);

        let mut total = self.empty_tally()?;
        let completed = fold_chunks_ordered(
            requested,
            chunk,
            |ls| {
                if self.stop_requested() {
                    return None;
                }
                let tally = self.simulate_lumisection(ls, &mut NoProgress, start);
                log::debug!("LS {} done (elapsed time: {:.3?})", ls + 1, start.elapsed());
                Some(tally)
            },
            |ls, tally| {
                total.merge(&tally)?;
                observer.on_lumisection_done(ls, start.elapsed());
                Ok(())
            },
        )?;
        if completed < requested {
            return Err(SimError::Interrupted {
                completed_ls: completed,
                requested_ls: requested,
            });
        }

        Ok(self.outcome(total, start.elapsed()))
    }
}

/// Map `0..n` on the Rayon pool `chunk` indices at a time and fold the
/// results in index order. At most `chunk` mapped values are alive at once.
///
/// `map` returning `None` stops the fold; the count of indices folded
/// before the first gap is returned.
fn fold_chunks_ordered<T, M, F>(n: u32, chunk: usize, map: M, mut fold: F) -> SimResult<u32>
where
    T: Send,
    M: Fn(u32) -> Option<SimResult<T>> + Sync,
    F: FnMut(u32, T) -> SimResult<()>,
{
    let chunk = u32::try_from(chunk.max(1)).unwrap_or(u32::MAX);
    let mut completed = 0u32;
    let mut begin = 0u32;
    while begin < n {
        let end = begin.saturating_add(chunk).min(n);
        let results: Vec<Option<SimResult<T>>> = (begin..end).into_par_iter().map(&map).collect();
        for (index, result) in (begin..end).zip(results) {
            match result {
                Some(value) => {
                    fold(index, value?)?;
                    completed += 1;
                }
                None => return Ok(completed),
            }
        }
        begin = end;
    }
    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Every third slot filled, luminosity rising with bx.
    fn small_fill(n_bx: usize) -> BunchFill {
        BunchFill::from_lumi(
            (0..n_bx)
                .map(|i| if i % 3 == 0 { 1.0 + i as f64 / 100.0 } else { 0.0 })
                .collect(),
        )
        .unwrap()
    }

    fn small_config(mode: RunMode) -> SimulationConfig {
        SimulationConfig {
            run_duration_ls: 3,
            orbits_per_ls: 8,
            n_bx_in_orbit: 120,
            target_trigger_rate: 4.0,
            mode,
            seed: 17,
            ..SimulationConfig::default()
        }
    }

    #[derive(Default)]
    struct Recorder {
        orbits: Vec<(u32, u32)>,
        lumisections: Vec<u32>,
        done: Vec<u32>,
    }

    impl ProgressObserver for Recorder {
        fn on_progress(&mut self, lumisection: u32, orbit: u32, _elapsed: Duration) {
            self.orbits.push((lumisection, orbit));
        }
        fn on_lumisection(&mut self, lumisection: u32, _elapsed: Duration) {
            self.lumisections.push(lumisection);
        }
        fn on_lumisection_done(&mut self, lumisection: u32, _elapsed: Duration) {
            self.done.push(lumisection);
        }
    }

    /// Raises the stop flag once lumisection `after` has been folded in.
    struct StopAfter {
        flag: Arc<AtomicBool>,
        after: u32,
        done: Vec<u32>,
    }

    impl ProgressObserver for StopAfter {
        fn on_progress(&mut self, _lumisection: u32, _orbit: u32, _elapsed: Duration) {}
        fn on_lumisection_done(&mut self, lumisection: u32, _elapsed: Duration) {
            self.done.push(lumisection);
            if lumisection == self.after {
                self.flag.store(true, Ordering::Relaxed);
            }
        }
    }

    /// Counts live instances and the peak number alive at once.
    struct Tracked {
        live: Arc<AtomicUsize>,
    }

    impl Tracked {
        fn new(live: &Arc<AtomicUsize>, peak: &AtomicUsize) -> Self {
            let now = live.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            Tracked { live: live.clone() }
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_probability_closed_form() {
        let p = trigger_probability(20.0, 1 << 10, 2000).unwrap();
        assert_eq!(p, 20.0 / (1024.0 * 2000.0));
    }

    #[test]
    fn test_probability_errors() {
        assert!(matches!(trigger_probability(20.0, 1024, 0), Err(SimError::InvalidRate(_))));
        assert!(matches!(trigger_probability(1e9, 1, 10), Err(SimError::InvalidRate(_))));
        assert!(matches!(
            trigger_probability(f64::NAN, 1024, 10),
            Err(SimError::InvalidRate(_))
        ));
        assert!(matches!(trigger_probability(-1.0, 1024, 10), Err(SimError::InvalidRate(_))));
        assert_eq!(trigger_probability(0.0, 1024, 10).unwrap(), 0.0);
    }

    #[test]
    fn test_weighted_probabilities_preserve_total() {
        let slots = small_fill(120).non_empty_slots();
        let probs = weighted_trigger_probabilities(4.0, 8, &slots).unwrap();
        let uniform = trigger_probability(4.0, 8, slots.len()).unwrap();
        let sum: f64 = probs.iter().sum();
        assert!((sum - uniform * slots.len() as f64).abs() < 1e-12);
        assert!(probs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_weighted_probability_above_one_rejected() {
        let fill = BunchFill::from_lumi(vec![100.0, 0.001, 0.001]).unwrap();
        let slots = fill.non_empty_slots();
        assert!(matches!(
            weighted_trigger_probabilities(2.0, 1, &slots),
            Err(SimError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_empty_fill_rejected() {
        let cfg = small_config(RunMode::TriggerCount);
        let fill = BunchFill::from_lumi(vec![0.0; 120]).unwrap();
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        assert!(matches!(
            TriggerSimulator::new(&cfg, &fill, &model),
            Err(SimError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_fill_length_mismatch_rejected() {
        let cfg = small_config(RunMode::TriggerCount);
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        assert!(matches!(
            TriggerSimulator::new(&cfg, &small_fill(90), &model),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected_before_loop() {
        let mut cfg = small_config(RunMode::TriggerCount);
        cfg.target_trigger_rate = f64::NAN;
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        assert!(matches!(
            TriggerSimulator::new(&cfg, &small_fill(120), &model),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_charge_mode_fills_every_draw() {
        let cfg = small_config(RunMode::ChargeHistogram);
        let fill = small_fill(120);
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        let sim = TriggerSimulator::new(&cfg, &fill, &model).unwrap();
        let out = sim.run(&mut NoProgress).unwrap();

        let expected = 3 * 8 * fill.n_non_empty() as u64;
        let hists = out.charge.as_ref().unwrap();
        assert_eq!(hists.charge.entries(), expected);
        assert_eq!(hists.charge_vs_bx.entries(), hists.charge.entries());
        assert_eq!(out.non_empty_trials, expected);
        assert!(out.triggered.is_none());
        assert!(out.observed_rate().is_none());

        // Only filled bunch crossings appear on the bx axis.
        for (bx, row) in hists.charge_vs_bx.counts.outer_iter().enumerate() {
            let filled = bx < 120 && bx % 3 == 0;
            assert_eq!(row.sum() > 0, filled, "bx {bx}");
        }
    }

    #[test]
    fn test_trigger_mode_counts() {
        let cfg = small_config(RunMode::TriggerCount);
        let fill = small_fill(120);
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        let sim = TriggerSimulator::new(&cfg, &fill, &model).unwrap();
        let out = sim.run(&mut NoProgress).unwrap();
        assert!(out.charge.is_none());
        let n = out.triggered.unwrap();
        assert!(n <= out.non_empty_trials);
        assert_eq!(out.total_crossings(), 3 * 8 * 120);
    }

    #[test]
    fn test_observed_rate_converges() {
        let n_bx = 3564;
        let lumi = (0..n_bx).map(|i| if i < 2000 { 1.0 } else { 0.0 }).collect();
        let fill = BunchFill::from_lumi(lumi).unwrap();
        let cfg = SimulationConfig {
            run_duration_ls: 5,
            orbits_per_ls: 1024,
            n_bx_in_orbit: n_bx,
            target_trigger_rate: 0.01 * 1024.0 * 2000.0,
            mode: RunMode::TriggerCount,
            ..SimulationConfig::default()
        };
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        let sim = TriggerSimulator::new(&cfg, &fill, &model).unwrap();
        assert!((sim.p_trigger() - 0.01).abs() < 1e-15);

        // 5 x 1024 x 2000 > 10^7 trials.
        let out = sim.run_parallel(&mut NoProgress).unwrap();
        assert!(out.non_empty_trials > 10_000_000);
        let expected = 0.01 * 2000.0 / n_bx as f64;
        assert!((out.expected_rate() - expected).abs() < 1e-12);
        let observed = out.observed_rate().unwrap();
        assert!(
            (observed - expected).abs() < 0.05 * expected,
            "observed {observed}, expected {expected}"
        );
        let per_ls = out.observed_triggers_per_ls().unwrap();
        assert!((per_ls - cfg.target_trigger_rate).abs() < 0.05 * cfg.target_trigger_rate);
    }

    #[test]
    fn test_weighted_observed_rate_converges() {
        let n_bx = 3564;
        let lumi = (0..n_bx)
            .map(|i| if i < 2000 { 0.5 + (i % 7) as f64 * 0.25 } else { 0.0 })
            .collect();
        let fill = BunchFill::from_lumi(lumi).unwrap();
        let cfg = SimulationConfig {
            run_duration_ls: 5,
            orbits_per_ls: 1024,
            n_bx_in_orbit: n_bx,
            target_trigger_rate: 0.01 * 1024.0 * 2000.0,
            weighting: TriggerWeighting::LuminosityWeighted,
            mode: RunMode::TriggerCount,
            ..SimulationConfig::default()
        };
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        let sim = TriggerSimulator::new(&cfg, &fill, &model).unwrap();
        let probs = sim.probabilities();
        assert!(probs.iter().any(|&p| p > 0.012) && probs.iter().any(|&p| p < 0.005));

        let out = sim.run_parallel(&mut NoProgress).unwrap();
        assert_eq!(out.weighting, TriggerWeighting::LuminosityWeighted);
        assert!(out.non_empty_trials > 10_000_000);
        let expected = 0.01 * 2000.0 / n_bx as f64;
        let observed = out.observed_rate().unwrap();
        assert!(
            (observed - expected).abs() < 0.05 * expected,
            "observed {observed}, expected {expected}"
        );
    }

    #[test]
    fn test_parallel_chunk_sizes_agree() {
        let cfg = SimulationConfig {
            run_duration_ls: 7,
            ..small_config(RunMode::Both)
        };
        let fill = small_fill(120);
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        let sequential = TriggerSimulator::new(&cfg, &fill, &model)
            .unwrap()
            .run(&mut NoProgress)
            .unwrap();
        for chunk in [1, 2, 5, 64] {
            let sim = TriggerSimulator::new(&cfg, &fill, &model)
                .unwrap()
                .with_parallel_chunk(chunk);
            let mut rec = Recorder::default();
            let out = sim.run_parallel(&mut rec).unwrap();
            assert_eq!(out.triggered, sequential.triggered, "chunk {chunk}");
            assert_eq!(out.charge, sequential.charge, "chunk {chunk}");
            assert_eq!(rec.done, (0..7).collect::<Vec<_>>());
            assert!(rec.orbits.is_empty());
        }
    }

    #[test]
    fn test_chunked_fold_bounds_live_values() {
        let live = Arc::new(AtomicUsize::new(0));
        let peak = AtomicUsize::new(0);
        let mut order = Vec::new();
        let completed = fold_chunks_ordered(
            40,
            4,
            |_| Some(Ok(Tracked::new(&live, &peak))),
            |i, value| {
                order.push(i);
                drop(value);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(completed, 40);
        assert_eq!(order, (0..40).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 4, "peak {}", peak.load(Ordering::SeqCst));
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_chunked_fold_stops_at_first_gap() {
        let completed = fold_chunks_ordered(
            20,
            3,
            |i| if i == 10 { None } else { Some(Ok(i)) },
            |_, _| Ok(()),
        )
        .unwrap();
        assert_eq!(completed, 10);

        let err = fold_chunks_ordered(
            20,
            3,
            |i| {
                if i == 5 {
                    Some(Err(SimError::Sampling("bad draw".into())))
                } else {
                    Some(Ok(i))
                }
            },
            |_, _| Ok(()),
        );
        assert!(matches!(err, Err(SimError::Sampling(_))));
    }

    #[test]
    fn test_determinism_and_parallel_agreement() {
        let cfg = small_config(RunMode::Both);
        let fill = small_fill(120);
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        let sim = TriggerSimulator::new(&cfg, &fill, &model).unwrap();
        let a = sim.run(&mut NoProgress).unwrap();
        let b = sim.run(&mut NoProgress).unwrap();
        let c = sim.run_parallel(&mut NoProgress).unwrap();
        assert_eq!(a.triggered, b.triggered);
        assert_eq!(a.charge, b.charge);
        assert_eq!(a.triggered, c.triggered);
        assert_eq!(a.charge, c.charge);
    }

    #[test]
    fn test_modes_share_streams() {
        let fill = small_fill(120);
        let both_cfg = small_config(RunMode::Both);
        let model = ChargeModel::from_config(&both_cfg.charge).unwrap();
        let both = TriggerSimulator::new(&both_cfg, &fill, &model)
            .unwrap()
            .run(&mut NoProgress)
            .unwrap();

        let trig_cfg = small_config(RunMode::TriggerCount);
        let trig = TriggerSimulator::new(&trig_cfg, &fill, &model)
            .unwrap()
            .run(&mut NoProgress)
            .unwrap();
        let charge_cfg = small_config(RunMode::ChargeHistogram);
        let charge = TriggerSimulator::new(&charge_cfg, &fill, &model)
            .unwrap()
            .run(&mut NoProgress)
            .unwrap();

        assert_eq!(both.triggered, trig.triggered);
        assert_eq!(both.charge, charge.charge);
    }

    #[test]
    fn test_different_seeds_differ() {
        let fill = small_fill(120);
        let cfg_a = small_config(RunMode::ChargeHistogram);
        let cfg_b = SimulationConfig {
            seed: 18,
            ..cfg_a.clone()
        };
        let model = ChargeModel::from_config(&cfg_a.charge).unwrap();
        let a = TriggerSimulator::new(&cfg_a, &fill, &model).unwrap().run(&mut NoProgress).unwrap();
        let b = TriggerSimulator::new(&cfg_b, &fill, &model).unwrap().run(&mut NoProgress).unwrap();
        assert_ne!(a.charge, b.charge);
    }

    #[test]
    fn test_observer_checkpoints() {
        let cfg = SimulationConfig {
            run_duration_ls: 12,
            orbits_per_ls: 16,
            ..small_config(RunMode::TriggerCount)
        };
        let fill = small_fill(120);
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        let sim = TriggerSimulator::new(&cfg, &fill, &model).unwrap();
        let mut rec = Recorder::default();
        let out = sim.run(&mut rec).unwrap();
        assert_eq!(rec.lumisections, vec![0, 10]);
        // 16 / 5 = 3 → orbits 0, 3, 6, 9, 12, 15 in each of 12 lumisections.
        assert_eq!(rec.orbits.len(), 12 * 6);
        assert_eq!(rec.orbits[1], (0, 3));

        let quiet = sim.run(&mut NoProgress).unwrap();
        assert_eq!(out.triggered, quiet.triggered);
    }

    #[test]
    fn test_stop_flag_interrupts() {
        let cfg = small_config(RunMode::TriggerCount);
        let fill = small_fill(120);
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let sim = TriggerSimulator::new(&cfg, &fill, &model)
            .unwrap()
            .with_stop_flag(flag.clone());
        match sim.run(&mut NoProgress) {
            Err(SimError::Interrupted {
                completed_ls,
                requested_ls,
            }) => {
                assert_eq!(completed_ls, 0);
                assert_eq!(requested_ls, 3);
            }
            other => panic!("expected Interrupted, got {other:?}"),
        }
        assert!(matches!(sim.run_parallel(&mut NoProgress), Err(SimError::Interrupted { .. })));

        flag.store(false, Ordering::Relaxed);
        assert!(sim.run(&mut NoProgress).is_ok());
    }

    #[test]
    fn test_stop_flag_raised_mid_run() {
        let cfg = SimulationConfig {
            run_duration_ls: 12,
            ..small_config(RunMode::Both)
        };
        let fill = small_fill(120);
        let model = ChargeModel::from_config(&cfg.charge).unwrap();
        let flag = Arc::new(AtomicBool::new(false));
        let sim = TriggerSimulator::new(&cfg, &fill, &model)
            .unwrap()
            .with_stop_flag(flag.clone())
            .with_parallel_chunk(2);

        let mut observer = StopAfter {
            flag: flag.clone(),
            after: 3,
            done: Vec::new(),
        };
        match sim.run(&mut observer) {
            Err(SimError::Interrupted {
                completed_ls,
                requested_ls,
            }) => {
                assert_eq!(completed_ls, 4);
                assert_eq!(requested_ls, 12);
            }
            other => panic!("expected Interrupted, got {other:?}"),
        }
        assert_eq!(observer.done, vec![0, 1, 2, 3]);

        flag.store(false, Ordering::Relaxed);
        let mut observer = StopAfter {
            flag: flag.clone(),
            after: 3,
            done: Vec::new(),
        };
        match sim.run_parallel(&mut observer) {
            Err(SimError::Interrupted {
                completed_ls,
                requested_ls,
            }) => {
                assert!(completed_ls < requested_ls);
                // The flag is raised between chunks [2, 3] and [4, 5].
                assert_eq!(completed_ls, 4);
            }
            other => panic!("expected Interrupted, got {other:?}"),
        }
        assert_eq!(observer.done, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_stream_seeds_distinct() {
        let a = stream_seed(1, 0, TRIGGER_STREAM);
        let b = stream_seed(1, 0, CHARGE_STREAM);
        let c = stream_seed(1, 1, TRIGGER_STREAM);
        let d = stream_seed(2, 0, TRIGGER_STREAM);
        assert!(a != b && a != c && a != d && b != c);
    }
}
