// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{
    lumisection_duration_s, BUNCH_SPACING_S, CHARGE_MPV, CHARGE_WIDTH, N_BX_IN_ORBIT,
    N_ORBITS_IN_LUMISECTION,
};
use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which aggregates a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Fill the 1D and 2D cluster-charge histograms.
    #[default]
    ChargeHistogram,
    /// Count Bernoulli trigger decisions only.
    TriggerCount,
    /// Both of the above from the same pass.
    Both,
}

impl RunMode {
    pub fn fills_charge(self) -> bool {
        matches!(self, RunMode::ChargeHistogram | RunMode::Both)
    }

    pub fn counts_triggers(self) -> bool {
        matches!(self, RunMode::TriggerCount | RunMode::Both)
    }
}

/// How the target trigger rate is spread over non-empty crossings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerWeighting {
    /// One probability shared by every non-empty crossing.
    #[default]
    Uniform,
    /// Probability proportional to each crossing's initial luminosity.
    LuminosityWeighted,
}

/// Top-level simulation configuration.
/// Every field is optional in JSON; omitted fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run duration in lumisections.
    #[serde(default = "default_run_duration_ls")]
    pub run_duration_ls: u32,
    /// Orbits per lumisection, must be a power of two.
    #[serde(default = "default_orbits_per_ls")]
    pub orbits_per_ls: u32,
    #[serde(default = "default_n_bx_in_orbit")]
    pub n_bx_in_orbit: usize,
    /// Bunch spacing [s].
    #[serde(default = "default_bunch_spacing_s")]
    pub bunch_spacing_s: f64,
    /// Initial instantaneous luminosity [1e30 cm^-2 s^-1]. Not consumed yet.
    #[serde(default = "default_init_lumi")]
    pub init_lumi: f64,
    /// Target zero-bias trigger count per lumisection (triggers/LS, not Hz).
    #[serde(default = "default_target_trigger_rate")]
    pub target_trigger_rate: f64,
    /// Probability of a minimum-ionising hit. Not consumed yet.
    #[serde(default = "default_p_mip")]
    pub p_mip: f64,
    #[serde(default)]
    pub hip: HipParams,
    #[serde(default)]
    pub charge: ChargeConfig,
    #[serde(default)]
    pub weighting: TriggerWeighting,
    #[serde(default)]
    pub mode: RunMode,
    /// Run seed; every lumisection derives its own streams from it.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub histograms: HistogramConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
}

fn default_run_duration_ls() -> u32 {
    1
}
fn default_orbits_per_ls() -> u32 {
    N_ORBITS_IN_LUMISECTION
}
fn default_n_bx_in_orbit() -> usize {
    N_BX_IN_ORBIT
}
fn default_bunch_spacing_s() -> f64 {
    BUNCH_SPACING_S
}
fn default_init_lumi() -> f64 {
    700.0
}
fn default_target_trigger_rate() -> f64 {
    20.0
}
fn default_p_mip() -> f64 {
    0.5
}
fn default_seed() -> u64 {
    273_162
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            run_duration_ls: default_run_duration_ls(),
            orbits_per_ls: default_orbits_per_ls(),
            n_bx_in_orbit: default_n_bx_in_orbit(),
            bunch_spacing_s: default_bunch_spacing_s(),
            init_lumi: default_init_lumi(),
            target_trigger_rate: default_target_trigger_rate(),
            p_mip: default_p_mip(),
            hip: HipParams::default(),
            charge: ChargeConfig::default(),
            weighting: TriggerWeighting::default(),
            mode: RunMode::default(),
            seed: default_seed(),
            histograms: HistogramConfig::default(),
            progress: ProgressConfig::default(),
        }
    }
}

/// Highly-ionising-particle recovery model parameters.
/// Carried for a future dead-time sub-model; the simulation loop does not read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HipParams {
    /// Recovery time constant [ns].
    pub recovery_time_constant_ns: f64,
    /// Probability of a HIP per hit.
    pub probability: f64,
}

impl Default for HipParams {
    fn default() -> Self {
        HipParams {
            recovery_time_constant_ns: 300.0,
            probability: 1.0e-3,
        }
    }
}

/// Cluster-charge model selection and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeConfig {
    /// Draw from the Gaussian approximation instead of the Landau model.
    pub use_gaussian_approximation: bool,
    pub landau: LandauParams,
    pub gaussian: GaussianParams,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        ChargeConfig {
            use_gaussian_approximation: true,
            landau: LandauParams::default(),
            gaussian: GaussianParams::default(),
        }
    }
}

/// Landau model: location `mpv`, scale `width`, truncated to
/// `[lower_bound, mpv + tail_cutoff_widths * width]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandauParams {
    pub mpv: f64,
    pub width: f64,
    pub lower_bound: f64,
    pub tail_cutoff_widths: f64,
    /// Number of nodes in the tabulated CDF.
    pub table_points: usize,
}

impl Default for LandauParams {
    fn default() -> Self {
        LandauParams {
            mpv: CHARGE_MPV,
            width: CHARGE_WIDTH,
            lower_bound: 0.0,
            tail_cutoff_widths: 1000.0,
            table_points: 200_000,
        }
    }
}

impl LandauParams {
    pub fn upper_bound(&self) -> f64 {
        self.mpv + self.tail_cutoff_widths * self.width
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianParams {
    pub mean: f64,
    pub sigma: f64,
}

impl Default for GaussianParams {
    fn default() -> Self {
        GaussianParams {
            mean: CHARGE_MPV,
            sigma: CHARGE_WIDTH,
        }
    }
}

/// Binning of the charge histograms and the derived profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub charge_bins: usize,
    pub charge_min: f64,
    pub charge_max: f64,
    pub bx_bins: usize,
    pub bx_min: f64,
    pub bx_max: f64,
    /// Number of bx bins merged before profiling.
    pub profile_rebin: usize,
    /// Display range of the profile's mean charge axis.
    pub profile_min: f64,
    pub profile_max: f64,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        HistogramConfig {
            charge_bins: 400,
            charge_min: 0.0,
            charge_max: 400.0,
            bx_bins: 3600,
            bx_min: 0.0,
            bx_max: 3600.0,
            profile_rebin: 10,
            profile_min: 50.0,
            profile_max: 250.0,
        }
    }
}

/// Progress checkpoint spacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Orbit progress is reported `orbit_divisor` times per lumisection.
    pub orbit_divisor: u32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig { orbit_divisor: 5 }
    }
}

fn check_finite(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!("{name} must be finite, got {value}")))
    }
}

fn check_non_negative(name: &str, value: f64) -> SimResult<()> {
    check_finite(name, value)?;
    if value < 0.0 {
        return Err(SimError::InvalidConfig(format!("{name} must be >= 0, got {value}")));
    }
    Ok(())
}

fn check_probability(name: &str, value: f64) -> SimResult<()> {
    check_finite(name, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(SimError::InvalidConfig(format!(
            "{name} must lie in [0, 1], got {value}"
        )));
    }
    Ok(())
}

fn check_range(name: &str, min: f64, max: f64) -> SimResult<()> {
    check_finite(name, min)?;
    check_finite(name, max)?;
    if min >= max {
        return Err(SimError::InvalidConfig(format!(
            "{name} range is empty: [{min}, {max})"
        )));
    }
    Ok(())
}

impl SimulationConfig {
    /// Load from a JSON file and validate.
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject NaN, negative rates, out-of-range probabilities and empty binnings.
    /// Model-shape parameters (widths, sigmas) are checked when the charge model is built.
    pub fn validate(&self) -> SimResult<()> {
        if self.run_duration_ls == 0 {
            return Err(SimError::InvalidConfig(
                "run_duration_ls must be > 0".to_string(),
            ));
        }
        if !self.orbits_per_ls.is_power_of_two() {
            return Err(SimError::InvalidConfig(format!(
                "orbits_per_ls must be a power of two, got {}",
                self.orbits_per_ls
            )));
        }
        if self.n_bx_in_orbit == 0 {
            return Err(SimError::InvalidConfig(
                "n_bx_in_orbit must be > 0".to_string(),
            ));
        }
        check_non_negative("bunch_spacing_s", self.bunch_spacing_s)?;
        if self.bunch_spacing_s == 0.0 {
            return Err(SimError::InvalidConfig(
                "bunch_spacing_s must be > 0".to_string(),
            ));
        }
        check_non_negative("init_lumi", self.init_lumi)?;
        check_non_negative("target_trigger_rate", self.target_trigger_rate)?;
        check_probability("p_mip", self.p_mip)?;
        check_non_negative("hip.recovery_time_constant_ns", self.hip.recovery_time_constant_ns)?;
        check_probability("hip.probability", self.hip.probability)?;

        let landau = &self.charge.landau;
        check_finite("charge.landau.mpv", landau.mpv)?;
        check_finite("charge.landau.width", landau.width)?;
        check_finite("charge.landau.lower_bound", landau.lower_bound)?;
        check_non_negative("charge.landau.tail_cutoff_widths", landau.tail_cutoff_widths)?;
        check_finite("charge.gaussian.mean", self.charge.gaussian.mean)?;
        check_finite("charge.gaussian.sigma", self.charge.gaussian.sigma)?;

        let h = &self.histograms;
        if h.charge_bins == 0 || h.bx_bins == 0 {
            return Err(SimError::InvalidConfig(
                "histogram bin counts must be > 0".to_string(),
            ));
        }
        check_range("histograms.charge", h.charge_min, h.charge_max)?;
        check_range("histograms.bx", h.bx_min, h.bx_max)?;
        check_range("histograms.profile", h.profile_min, h.profile_max)?;
        if h.profile_rebin == 0 {
            return Err(SimError::InvalidConfig(
                "histograms.profile_rebin must be >= 1".to_string(),
            ));
        }
        if self.progress.orbit_divisor == 0 {
            return Err(SimError::InvalidConfig(
                "progress.orbit_divisor must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Lumisection duration [s] for this orbit structure.
    pub fn ls_duration_s(&self) -> f64 {
        lumisection_duration_s(self.orbits_per_ls, self.n_bx_in_orbit, self.bunch_spacing_s)
    }

    /// Total bunch crossings simulated, empty ones included.
    pub fn total_crossings(&self) -> u64 {
        self.run_duration_ls as u64 * self.orbits_per_ls as u64 * self.n_bx_in_orbit as u64
    }
}
