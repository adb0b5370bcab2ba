// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Run Summary
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! End-of-run summary: the `##### #####` block on stdout and `summary.json`.

use crate::format::count_with_commas;
use ccsim_core::trigger::SimulationOutcome;
use ccsim_types::config::{RunMode, TriggerWeighting};
use ccsim_types::constants::lumisection_duration_s;
use serde::Serialize;
use std::fmt;

const MARKER: &str = "##### #####";

/// Moments of the 1D charge histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeSummary {
    pub samples: u64,
    pub in_range: u64,
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub mode: RunMode,
    pub weighting: TriggerWeighting,
    pub run_duration_ls: u32,
    pub orbits_per_ls: u32,
    pub n_bx_in_orbit: usize,
    pub n_non_empty: usize,
    pub fraction_non_empty: f64,
    pub p_trigger: f64,
    pub ls_duration_s: f64,
    /// Triggers per lumisection requested.
    pub target_triggers_per_ls: f64,
    pub expected_rate_per_crossing: f64,
    pub observed_rate_per_crossing: Option<f64>,
    pub observed_triggers_per_ls: Option<f64>,
    pub observed_rate_hz: Option<f64>,
    pub expected_rate_hz: f64,
    pub triggered: Option<u64>,
    pub charge: Option<ChargeSummary>,
    pub elapsed_s: f64,
}

impl SummaryStats {
    pub fn from_outcome(outcome: &SimulationOutcome, bunch_spacing_s: f64) -> Self {
        let ls_duration_s =
            lumisection_duration_s(outcome.orbits_per_ls, outcome.n_bx_in_orbit, bunch_spacing_s);
        let observed_triggers_per_ls = outcome.observed_triggers_per_ls();
        let charge = outcome.charge.as_ref().map(|h| ChargeSummary {
            samples: h.charge.entries(),
            in_range: h.charge.in_range(),
            mean: h.charge.mean(),
            std_dev: h.charge.std_dev(),
        });

        SummaryStats {
            mode: outcome.mode,
            weighting: outcome.weighting,
            run_duration_ls: outcome.run_duration_ls,
            orbits_per_ls: outcome.orbits_per_ls,
            n_bx_in_orbit: outcome.n_bx_in_orbit,
            n_non_empty: outcome.n_non_empty,
            fraction_non_empty: outcome.fraction_non_empty(),
            p_trigger: outcome.p_trigger,
            ls_duration_s,
            target_triggers_per_ls: outcome.target_trigger_rate,
            expected_rate_per_crossing: outcome.expected_rate(),
            observed_rate_per_crossing: outcome.observed_rate(),
            observed_triggers_per_ls,
            observed_rate_hz: observed_triggers_per_ls.map(|n| n / ls_duration_s),
            expected_rate_hz: outcome.target_trigger_rate / ls_duration_s,
            triggered: outcome.triggered,
            charge,
            elapsed_s: outcome.elapsed.as_secs_f64(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{MARKER}")?;
        writeln!(
            f,
            "# Fraction of non-empty bunches: {:.1} %",
            self.fraction_non_empty * 100.0
        )?;
        writeln!(
            f,
            "# Lumisection: {} orbits x {} bx ({:.4} s)",
            self.orbits_per_ls, self.n_bx_in_orbit, self.ls_duration_s
        )?;
        writeln!(f, "# Trigger probability: {:.2e}", self.p_trigger)?;
        if let (Some(per_ls), Some(hz)) = (self.observed_triggers_per_ls, self.observed_rate_hz) {
            writeln!(
                f,
                "# Average observed (expected) trigger rate: {:.1} ({:.1}) triggers/LS, {:.1} ({:.1}) Hz",
                per_ls, self.target_triggers_per_ls, hz, self.expected_rate_hz
            )?;
        }
        if let Some(n) = self.triggered {
            writeln!(f, "# Number of triggered events: {}", count_with_commas(n))?;
        }
        if let Some(c) = &self.charge {
            writeln!(
                f,
                "# Charge samples: {} (mean {:.1}, std dev {:.1} ADC in range)",
                count_with_commas(c.samples),
                c.mean,
                c.std_dev
            )?;
        }
        writeln!(f, "# Script ran in {:.3} s", self.elapsed_s)?;
        write!(f, "{MARKER}")
    }
}
