// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Artifact Emission
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Writes the run artifacts: summary JSON, charge histograms and profile
//! as SVG and PNG, and the optional sampler overlay.
//!
//! A failing artifact is logged and skipped; the others are still written
//! and the returned `SimError::Report` lists every failure.

use crate::plots::{
    draw_charge_histogram, draw_density_overlay, draw_heatmap, draw_profile, HISTOGRAM_CANVAS,
    WIDE_CANVAS,
};
use crate::summary::SummaryStats;
use crate::surface::{PngSurface, Surface, SvgSurface};
use ccsim_core::charge::DensityOverlay;
use ccsim_core::trigger::SimulationOutcome;
use ccsim_types::config::HistogramConfig;
use ccsim_types::error::{SimError, SimResult};
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_JSON: &str = "summary.json";
pub const CHARGE_HISTOGRAM: &str = "h_cluster_charge";
pub const CHARGE_VS_BX: &str = "h_cluster_charge_vs_bx";
pub const CHARGE_PROFILE: &str = "px_cluster_charge_vs_bx";
pub const SAMPLER_OVERLAY: &str = "charge_sampler";

struct Emitter {
    dir: PathBuf,
    written: Vec<PathBuf>,
    failures: Vec<String>,
}

impl Emitter {
    fn open(dir: &Path) -> SimResult<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            log::warn!("cannot create output directory {}: {e}", dir.display());
            SimError::Report(format!("{}: {e}", dir.display()))
        })?;
        Ok(Emitter {
            dir: dir.to_path_buf(),
            written: Vec::new(),
            failures: Vec::new(),
        })
    }

    fn record(&mut self, path: PathBuf, result: SimResult<()>) {
        match result {
            Ok(()) => {
                log::info!("wrote {}", path.display());
                self.written.push(path);
            }
            Err(e) => {
                log::warn!("could not write {}: {e}", path.display());
                self.failures.push(format!("{}: {e}", path.display()));
            }
        }
    }

    fn fail(&mut self, what: &str, err: SimError) {
        log::warn!("skipping {what}: {err}");
        self.failures.push(format!("{what}: {err}"));
    }

    fn text(&mut self, name: &str, contents: &str) {
        let path = self.dir.join(name);
        let result = fs::write(&path, contents).map_err(SimError::from);
        self.record(path, result);
    }

    /// Draw once per backend: `<stem>.svg` and `<stem>.png`.
    fn plot(&mut self, stem: &str, canvas: (u32, u32), draw: impl Fn(&mut dyn Surface)) {
        let mut svg = SvgSurface::new(canvas.0, canvas.1);
        draw(&mut svg);
        self.text(&format!("{stem}.svg"), &svg.finish());

        let mut png = PngSurface::new(canvas.0, canvas.1);
        draw(&mut png);
        let path = self.dir.join(format!("{stem}.png"));
        let result = png.save(&path);
        self.record(path, result);
    }

    fn finish(self) -> SimResult<Vec<PathBuf>> {
        if self.failures.is_empty() {
            Ok(self.written)
        } else {
            Err(SimError::Report(self.failures.join("; ")))
        }
    }
}

/// Write the summary and, when charges were recorded, the three charge plots.
pub fn emit(
    outcome: &SimulationOutcome,
    summary: &SummaryStats,
    histograms: &HistogramConfig,
    output_dir: &Path,
) -> SimResult<Vec<PathBuf>> {
    let mut out = Emitter::open(output_dir)?;

    match summary.to_json() {
        Ok(json) => out.text(SUMMARY_JSON, &json),
        Err(e) => out.fail(SUMMARY_JSON, e.into()),
    }

    if let Some(charge) = &outcome.charge {
        out.plot(CHARGE_HISTOGRAM, HISTOGRAM_CANVAS, |s| {
            draw_charge_histogram(s, &charge.charge, "Cluster charge")
        });
        out.plot(CHARGE_VS_BX, WIDE_CANVAS, |s| {
            draw_heatmap(
                s,
                &charge.charge_vs_bx,
                "Cluster charge vs bunch crossing",
                "bunch crossing",
                "cluster charge [ADC]",
            )
        });
        match charge.charge_vs_bx.rebin_x(histograms.profile_rebin) {
            Ok(rebinned) => {
                let profile = rebinned.profile_x();
                let y_range = (histograms.profile_min, histograms.profile_max);
                out.plot(CHARGE_PROFILE, WIDE_CANVAS, |s| {
                    draw_profile(s, &profile, y_range, "Mean cluster charge vs bunch crossing")
                });
            }
            Err(e) => out.fail(CHARGE_PROFILE, e),
        }
    }

    out.finish()
}

/// Write `charge_sampler.{svg,png}` for a density overlay over `x_range`.
pub fn emit_density_overlay(
    overlay: &DensityOverlay,
    x_range: (f64, f64),
    output_dir: &Path,
) -> SimResult<Vec<PathBuf>> {
    let mut out = Emitter::open(output_dir)?;
    out.plot(SAMPLER_OVERLAY, HISTOGRAM_CANVAS, |s| {
        draw_density_overlay(s, overlay, x_range)
    });
    out.finish()
}
