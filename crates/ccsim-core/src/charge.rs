// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Charge Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cluster-charge models: Landau (tabulated inverse CDF) or Gaussian approximation.

use ccsim_math::inverse_cdf::TabulatedSampler;
use ccsim_math::landau::landau_pdf;
use ccsim_types::config::{ChargeConfig, GaussianParams, LandauParams};
use ccsim_types::error::{SimError, SimResult};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Source of cluster-charge samples.
#[derive(Debug, Clone)]
pub enum ChargeModel {
    Landau {
        params: LandauParams,
        table: TabulatedSampler,
    },
    Gaussian {
        params: GaussianParams,
        normal: Normal<f64>,
    },
}

/// Grid of the diagnostic density overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayGrid {
    pub x_min: f64,
    pub x_max: f64,
    pub step: f64,
    pub bins: usize,
}

impl Default for OverlayGrid {
    fn default() -> Self {
        OverlayGrid {
            x_min: 0.0,
            x_max: 500.0,
            step: 0.01,
            bins: 50,
        }
    }
}

/// Samples with the model density and a density-normalised histogram of the samples.
#[derive(Debug, Clone)]
pub struct DensityOverlay {
    pub samples: Vec<f64>,
    /// (x, density) on the overlay grid.
    pub curve: Vec<(f64, f64)>,
    /// (low edge, density) per histogram bin; normalised to the total sample count.
    pub histogram: Vec<(f64, f64)>,
    pub bin_width: f64,
    pub label: String,
}

impl ChargeModel {
    pub fn from_config(cfg: &ChargeConfig) -> SimResult<Self> {
        if cfg.use_gaussian_approximation {
            Self::gaussian(&cfg.gaussian)
        } else {
            Self::landau(&cfg.landau)
        }
    }

    /// Landau density at (mpv, width), truncated to x >= lower bound.
    pub fn landau(params: &LandauParams) -> SimResult<Self> {
        if !params.mpv.is_finite() {
            return Err(SimError::Sampling(format!(
                "Landau location must be finite, got {}",
                params.mpv
            )));
        }
        if !params.width.is_finite() || params.width <= 0.0 {
            return Err(SimError::Sampling(format!(
                "Landau width must be finite and > 0, got {}",
                params.width
            )));
        }
        let (mpv, width) = (params.mpv, params.width);
        let table = TabulatedSampler::from_density(
            |x| landau_pdf(x, mpv, width),
            params.lower_bound,
            params.upper_bound(),
            params.table_points,
        )?;
        Ok(ChargeModel::Landau {
            params: params.clone(),
            table,
        })
    }

    pub fn gaussian(params: &GaussianParams) -> SimResult<Self> {
        if !params.sigma.is_finite() || params.sigma <= 0.0 {
            return Err(SimError::Sampling(format!(
                "Gaussian sigma must be finite and > 0, got {}",
                params.sigma
            )));
        }
        let normal = Normal::new(params.mean, params.sigma)
            .map_err(|e| SimError::Sampling(e.to_string()))?;
        Ok(ChargeModel::Gaussian {
            params: params.clone(),
            normal,
        })
    }

    pub fn label(&self) -> String {
        match self {
            ChargeModel::Landau { params, .. } => {
                format!("Landau mu={:.1}, eta={:.1}", params.mpv, params.width)
            }
            ChargeModel::Gaussian { params, .. } => {
                format!("Gaussian mean={:.1}, sigma={:.1}", params.mean, params.sigma)
            }
        }
    }

    #[inline]
    pub fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            ChargeModel::Landau { table, .. } => table.sample(rng),
            ChargeModel::Gaussian { normal, .. } => normal.sample(rng),
        }
    }

    /// `n` i.i.d. charges. `n == 0` yields an empty vector.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        let mut out = Vec::with_capacity(n);
        self.sample_into(n, rng, &mut out);
        out
    }

    /// Refill `out` with `n` charges, reusing its allocation.
    pub fn sample_into<R: Rng + ?Sized>(&self, n: usize, rng: &mut R, out: &mut Vec<f64>) {
        out.clear();
        out.reserve(n);
        for _ in 0..n {
            out.push(self.sample_one(rng));
        }
    }

    /// Normalised density of the model as sampled (truncation included for Landau).
    pub fn density(&self, x: f64) -> f64 {
        match self {
            ChargeModel::Landau { params, table } => {
                if x < table.lower() || x > table.upper() {
                    0.0
                } else {
                    landau_pdf(x, params.mpv, params.width) / table.mass()
                }
            }
            ChargeModel::Gaussian { params, .. } => {
                let z = (x - params.mean) / params.sigma;
                (-0.5 * z * z).exp() / (params.sigma * (2.0 * PI).sqrt())
            }
        }
    }

    /// Diagnostic view: samples, the theoretical density and the empirical density.
    pub fn samples_with_density_overlay<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
        grid: OverlayGrid,
    ) -> SimResult<DensityOverlay> {
        if !(grid.step > 0.0) || grid.bins == 0 || !(grid.x_min < grid.x_max) {
            return Err(SimError::InvalidConfig(format!("invalid overlay grid {grid:?}")));
        }
        let samples = self.sample(n, rng);

        let n_points = ((grid.x_max - grid.x_min) / grid.step).ceil() as usize;
        let curve = (0..n_points)
            .map(|i| {
                let x = grid.x_min + i as f64 * grid.step;
                (x, self.density(x))
            })
            .collect();

        let bin_width = (grid.x_max - grid.x_min) / grid.bins as f64;
        let mut counts = vec![0u64; grid.bins];
        for &x in &samples {
            if x >= grid.x_min && x < grid.x_max {
                let i = (((x - grid.x_min) / bin_width) as usize).min(grid.bins - 1);
                counts[i] += 1;
            }
        }
        let norm = if samples.is_empty() {
            0.0
        } else {
            1.0 / (samples.len() as f64 * bin_width)
        };
        let histogram = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (grid.x_min + i as f64 * bin_width, c as f64 * norm))
            .collect();

        Ok(DensityOverlay {
            samples,
            curve,
            histogram,
            bin_width,
            label: self.label(),
        })
    }
}
