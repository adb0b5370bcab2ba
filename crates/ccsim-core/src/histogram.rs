// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Histograms
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fixed-binning 1D/2D histograms and the x-profile of a 2D histogram.
//!
//! Bin contents are integer counts, so merging per-lumisection partial
//! histograms is exact and order-independent.

use ccsim_types::config::HistogramConfig;
use ccsim_types::error::{SimError, SimResult};
use ndarray::Array2;
use serde::Serialize;

/// Uniform binning of `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Axis {
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

/// Where a value falls on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinIndex {
    Underflow,
    In(usize),
    /// Includes NaN.
    Overflow,
}

impl Axis {
    pub fn new(bins: usize, min: f64, max: f64) -> SimResult<Self> {
        if bins == 0 {
            return Err(SimError::InvalidConfig("axis needs at least one bin".to_string()));
        }
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(SimError::InvalidConfig(format!(
                "axis range must be finite and non-empty, got [{min}, {max})"
            )));
        }
        Ok(Axis { bins, min, max })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    #[inline]
    pub fn locate(&self, x: f64) -> BinIndex {
        if x < self.min {
            BinIndex::Underflow
        } else if x >= self.max || x.is_nan() {
            BinIndex::Overflow
        } else {
            let i = ((x - self.min) / self.width()) as usize;
            BinIndex::In(i.min(self.bins - 1))
        }
    }

    pub fn low_edge(&self, i: usize) -> f64 {
        self.min + i as f64 * self.width()
    }

    pub fn center(&self, i: usize) -> f64 {
        self.min + (i as f64 + 0.5) * self.width()
    }
}

fn check_same_axis(a: &Axis, b: &Axis) -> SimResult<()> {
    if a != b {
        return Err(SimError::InvalidConfig(format!(
            "cannot merge histograms with different axes: {a:?} vs {b:?}"
        )));
    }
    Ok(())
}

/// One-dimensional histogram with under/overflow and in-range moments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram1D {
    pub axis: Axis,
    pub counts: Vec<u64>,
    pub underflow: u64,
    pub overflow: u64,
    sum_x: f64,
    sum_x2: f64,
}

impl Histogram1D {
    pub fn new(axis: Axis) -> Self {
        Histogram1D {
            axis,
            counts: vec![0; axis.bins],
            underflow: 0,
            overflow: 0,
            sum_x: 0.0,
            sum_x2: 0.0,
        }
    }

    #[inline]
    pub fn fill(&mut self, x: f64) {
        match self.axis.locate(x) {
            BinIndex::Underflow => self.underflow += 1,
            BinIndex::Overflow => self.overflow += 1,
            BinIndex::In(i) => {
                self.counts[i] += 1;
                self.sum_x += x;
                self.sum_x2 += x * x;
            }
        }
    }

    pub fn fill_all(&mut self, xs: &[f64]) {
        for &x in xs {
            self.fill(x);
        }
    }

    /// Every fill, including under/overflow.
    pub fn entries(&self) -> u64 {
        self.in_range() + self.underflow + self.overflow
    }

    pub fn in_range(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Mean of the in-range values; 0 when empty.
    pub fn mean(&self) -> f64 {
        let n = self.in_range();
        if n == 0 {
            return 0.0;
        }
        self.sum_x / n as f64
    }

    /// Population standard deviation of the in-range values.
    pub fn std_dev(&self) -> f64 {
        let n = self.in_range();
        if n == 0 {
            return 0.0;
        }
        let m = self.mean();
        (self.sum_x2 / n as f64 - m * m).max(0.0).sqrt()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn merge(&mut self, other: &Histogram1D) -> SimResult<()> {
        check_same_axis(&self.axis, &other.axis)?;
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.sum_x += other.sum_x;
        self.sum_x2 += other.sum_x2;
        Ok(())
    }
}

/// Two-dimensional count histogram, stored `[x_bin, y_bin]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2D {
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub counts: Array2<u64>,
    /// Fills outside the x or y range.
    pub outside: u64,
}

impl Histogram2D {
    pub fn new(x_axis: Axis, y_axis: Axis) -> Self {
        Histogram2D {
            x_axis,
            y_axis,
            counts: Array2::zeros((x_axis.bins, y_axis.bins)),
            outside: 0,
        }
    }

    #[inline]
    pub fn fill(&mut self, x: f64, y: f64) {
        match (self.x_axis.locate(x), self.y_axis.locate(y)) {
            (BinIndex::In(i), BinIndex::In(j)) => self.counts[[i, j]] += 1,
            _ => self.outside += 1,
        }
    }

    pub fn entries(&self) -> u64 {
        self.in_range() + self.outside
    }

    pub fn in_range(&self) -> u64 {
        self.counts.sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn merge(&mut self, other: &Histogram2D) -> SimResult<()> {
        check_same_axis(&self.x_axis, &other.x_axis)?;
        check_same_axis(&self.y_axis, &other.y_axis)?;
        self.counts += &other.counts;
        self.outside += other.outside;
        Ok(())
    }

    /// Merge groups of `factor` adjacent x bins.
    /// Trailing bins that do not fill a whole group move to `outside`.
    pub fn rebin_x(&self, factor: usize) -> SimResult<Histogram2D> {
        if factor == 0 || factor > self.x_axis.bins {
            return Err(SimError::InvalidConfig(format!(
                "rebin factor {factor} invalid for {} x bins",
                self.x_axis.bins
            )));
        }
        let new_bins = self.x_axis.bins / factor;
        let new_max = self.x_axis.min + (new_bins * factor) as f64 * self.x_axis.width();
        let x_axis = Axis::new(new_bins, self.x_axis.min, new_max)?;

        let mut rebinned = Histogram2D::new(x_axis, self.y_axis);
        rebinned.outside = self.outside;
        for (i, row) in self.counts.outer_iter().enumerate() {
            let target = i / factor;
            if target < new_bins {
                let mut dst = rebinned.counts.row_mut(target);
                dst += &row;
            } else {
                rebinned.outside += row.sum();
            }
        }
        Ok(rebinned)
    }

    /// Mean of y (at bin centres) in each x bin.
    pub fn profile_x(&self) -> Profile {
        let nx = self.x_axis.bins;
        let mut profile = Profile {
            axis: self.x_axis,
            entries: vec![0; nx],
            sum_y: vec![0.0; nx],
            sum_y2: vec![0.0; nx],
        };
        for (i, row) in self.counts.outer_iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                if c == 0 {
                    continue;
                }
                let y = self.y_axis.center(j);
                let w = c as f64;
                profile.entries[i] += c;
                profile.sum_y[i] += w * y;
                profile.sum_y2[i] += w * y * y;
            }
        }
        profile
    }
}

/// Per-x-bin mean and error of the mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub axis: Axis,
    pub entries: Vec<u64>,
    sum_y: Vec<f64>,
    sum_y2: Vec<f64>,
}

impl Profile {
    pub fn mean(&self, i: usize) -> Option<f64> {
        match self.entries[i] {
            0 => None,
            n => Some(self.sum_y[i] / n as f64),
        }
    }

    pub fn spread(&self, i: usize) -> Option<f64> {
        let n = self.entries[i];
        let m = self.mean(i)?;
        Some((self.sum_y2[i] / n as f64 - m * m).max(0.0).sqrt())
    }

    /// Standard error of the mean.
    pub fn error(&self, i: usize) -> Option<f64> {
        let n = self.entries[i];
        Some(self.spread(i)? / (n as f64).sqrt())
    }

    /// Non-empty bins as (centre, mean, error).
    pub fn points(&self) -> Vec<(f64, f64, f64)> {
        (0..self.axis.bins)
            .filter_map(|i| {
                let m = self.mean(i)?;
                let e = self.error(i)?;
                Some((self.axis.center(i), m, e))
            })
            .collect()
    }
}

/// The charge aggregates of a run: 1D charge and 2D charge-vs-bx.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeHistograms {
    pub charge: Histogram1D,
    pub charge_vs_bx: Histogram2D,
}

impl ChargeHistograms {
    pub fn new(cfg: &HistogramConfig) -> SimResult<Self> {
        let charge_axis = Axis::new(cfg.charge_bins, cfg.charge_min, cfg.charge_max)?;
        let bx_axis = Axis::new(cfg.bx_bins, cfg.bx_min, cfg.bx_max)?;
        Ok(ChargeHistograms {
            charge: Histogram1D::new(charge_axis),
            charge_vs_bx: Histogram2D::new(bx_axis, charge_axis),
        })
    }

    #[inline]
    pub fn fill(&mut self, bx: usize, charge: f64) {
        self.charge.fill(charge);
        self.charge_vs_bx.fill(bx as f64, charge);
    }

    /// Number of charge samples folded in.
    pub fn samples(&self) -> u64 {
        self.charge.entries()
    }

    pub fn merge(&mut self, other: &ChargeHistograms) -> SimResult<()> {
        self.charge.merge(&other.charge)?;
        self.charge_vs_bx.merge(&other.charge_vs_bx)
    }
}
