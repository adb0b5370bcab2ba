// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Plots
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Histogram, heat-map, profile and density-overlay plots on a `Surface`.

use crate::format::count_with_commas;
use crate::surface::{Anchor, Rgb8, Surface, BLACK, BLUE, GREY, RED};
use ccsim_core::charge::DensityOverlay;
use ccsim_core::histogram::{Histogram1D, Histogram2D, Profile};
use ndarray::Array2;

/// 1D charge histogram canvas.
pub const HISTOGRAM_CANVAS: (u32, u32) = (600, 600);
/// 2D histogram and profile canvas.
pub const WIDE_CANVAS: (u32, u32) = (1200, 600);

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
/// Room for the colour scale of a heat map.
const PALETTE_MARGIN: f64 = 90.0;
/// Heat-map cells are at least this many pixels wide and high.
const HEATMAP_CELL_PX: f64 = 2.0;
/// Polyline points kept per curve.
const MAX_CURVE_POINTS: usize = 2000;

const VIRIDIS: [(f64, Rgb8); 5] = [
    (0.00, [68, 1, 84]),
    (0.25, [59, 82, 139]),
    (0.50, [33, 145, 140]),
    (0.75, [94, 201, 98]),
    (1.00, [253, 231, 37]),
];

/// Plot area inside a canvas, with data-to-pixel mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl Frame {
    pub fn new(canvas: (u32, u32), right_margin: f64, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Frame {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: canvas.0 as f64 - MARGIN_LEFT - right_margin,
            height: canvas.1 as f64 - MARGIN_TOP - MARGIN_BOTTOM,
            x_range,
            y_range,
        }
    }

    #[inline]
    pub fn px(&self, x: f64) -> f64 {
        self.left + (x - self.x_range.0) / (self.x_range.1 - self.x_range.0) * self.width
    }

    #[inline]
    pub fn py(&self, y: f64) -> f64 {
        self.top + self.height - (y - self.y_range.0) / (self.y_range.1 - self.y_range.0) * self.height
    }

    pub fn contains_y(&self, y: f64) -> bool {
        y >= self.y_range.0 && y <= self.y_range.1
    }

    pub fn draw_axes(&self, s: &mut dyn Surface, title: &str, x_label: &str, y_label: &str) {
        let bottom = self.top + self.height;
        let right = self.left + self.width;
        s.line(self.left, bottom, right, bottom, BLACK, 1.0);
        s.line(self.left, self.top, self.left, bottom, BLACK, 1.0);
        s.line(self.left, self.top, right, self.top, GREY, 1.0);
        s.line(right, self.top, right, bottom, GREY, 1.0);

        let x_step = nice_step(self.x_range.1 - self.x_range.0, 8);
        for x in ticks(self.x_range, x_step) {
            let px = self.px(x);
            s.line(px, bottom, px, bottom - 6.0, BLACK, 1.0);
            s.text(px, bottom + 18.0, 12.0, Anchor::Middle, &tick_label(x, x_step));
        }
        let y_step = nice_step(self.y_range.1 - self.y_range.0, 8);
        for y in ticks(self.y_range, y_step) {
            let py = self.py(y);
            s.line(self.left, py, self.left + 6.0, py, BLACK, 1.0);
            s.text(self.left - 8.0, py + 4.0, 12.0, Anchor::End, &tick_label(y, y_step));
        }

        s.text(self.left + self.width / 2.0, self.top - 18.0, 16.0, Anchor::Middle, title);
        s.text(right, bottom + 42.0, 13.0, Anchor::End, x_label);
        s.text(self.left - 8.0, self.top - 8.0, 13.0, Anchor::End, y_label);
    }
}

/// Tick spacing of the form {1, 2, 5} × 10^k giving about `target` ticks.
pub fn nice_step(span: f64, target: usize) -> f64 {
    if !(span > 0.0) || !span.is_finite() {
        return 1.0;
    }
    let raw = span / target.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let factor = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

fn ticks(range: (f64, f64), step: f64) -> Vec<f64> {
    let first = (range.0 / step).ceil() as i64;
    let last = (range.1 / step + 1e-9).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

fn tick_label(v: f64, step: f64) -> String {
    let decimals = (-step.log10().floor()).max(0.0) as usize;
    format!("{v:.decimals$}")
}

/// Viridis colour for `t` in [0, 1].
pub fn palette(t: f64) -> Rgb8 {
    let t = t.clamp(0.0, 1.0);
    for w in VIRIDIS.windows(2) {
        let (t0, c0) = w[0];
        let (t1, c1) = w[1];
        if t <= t1 {
            let f = (t - t0) / (t1 - t0);
            let mix = |a: u8, b: u8| (a as f64 + f * (b as f64 - a as f64)).round() as u8;
            return [mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2])];
        }
    }
    VIRIDIS[VIRIDIS.len() - 1].1
}

/// Sum `counts` into an `nx × ny` grid of adjacent-bin groups.
pub fn downsample(counts: &Array2<u64>, nx: usize, ny: usize) -> Array2<u64> {
    let (sx, sy) = counts.dim();
    let nx = nx.clamp(1, sx.max(1));
    let ny = ny.clamp(1, sy.max(1));
    let mut out = Array2::zeros((nx, ny));
    for ((i, j), &c) in counts.indexed_iter() {
        if c > 0 {
            out[[i * nx / sx, j * ny / sy]] += c;
        }
    }
    out
}

fn step_outline(frame: &Frame, edges_and_heights: impl Iterator<Item = (f64, f64, f64)>) -> Vec<(f64, f64)> {
    let base = frame.py(frame.y_range.0.max(0.0));
    let mut points = Vec::new();
    for (lo, hi, h) in edges_and_heights {
        let y = frame.py(h.min(frame.y_range.1));
        if points.is_empty() {
            points.push((frame.px(lo), base));
        }
        points.push((frame.px(lo), y));
        points.push((frame.px(hi), y));
    }
    if let Some(&(x, _)) = points.last() {
        points.push((x, base));
    }
    points
}

fn thin(points: &[(f64, f64)], max_points: usize) -> Vec<(f64, f64)> {
    let stride = points.len().div_ceil(max_points.max(1)).max(1);
    points.iter().step_by(stride).copied().collect()
}

/// Charge histogram as a step outline, with an entries/mean/std-dev box.
pub fn draw_charge_histogram(s: &mut dyn Surface, h: &Histogram1D, title: &str) {
    let axis = h.axis;
    let y_max = (h.max_count() as f64 * 1.1).max(1.0);
    let frame = Frame::new(s.size(), MARGIN_RIGHT, (axis.min, axis.max), (0.0, y_max));

    let bins = (0..axis.bins).map(|i| (axis.low_edge(i), axis.low_edge(i + 1), h.counts[i] as f64));
    let outline = step_outline(&frame, bins);
    s.polyline(&outline, BLUE, 1.5);
    frame.draw_axes(s, title, "cluster charge [ADC]", "entries");

    let x = frame.left + frame.width - 10.0;
    let y = frame.top + 20.0;
    s.text(x, y, 12.0, Anchor::End, &format!("Entries {}", count_with_commas(h.entries())));
    s.text(x, y + 16.0, 12.0, Anchor::End, &format!("Mean {:.2}", h.mean()));
    s.text(x, y + 32.0, 12.0, Anchor::End, &format!("Std Dev {:.2}", h.std_dev()));
}

/// Counts of `h` as a heat map (x horizontal, y vertical) with a colour scale.
pub fn draw_heatmap(s: &mut dyn Surface, h: &Histogram2D, title: &str, x_label: &str, y_label: &str) {
    let frame = Frame::new(
        s.size(),
        PALETTE_MARGIN,
        (h.x_axis.min, h.x_axis.max),
        (h.y_axis.min, h.y_axis.max),
    );
    let nx = ((frame.width / HEATMAP_CELL_PX) as usize).min(h.x_axis.bins);
    let ny = ((frame.height / HEATMAP_CELL_PX) as usize).min(h.y_axis.bins);
    let grid = downsample(&h.counts, nx, ny);
    let (nx, ny) = grid.dim();
    let max = grid.iter().copied().max().unwrap_or(0);
    let cell_w = frame.width / nx as f64;
    let cell_h = frame.height / ny as f64;

    if max > 0 {
        for j in 0..ny {
            let y = frame.top + frame.height - (j + 1) as f64 * cell_h;
            // Runs of equal colour become one rectangle.
            let mut i = 0;
            while i < nx {
                let c = grid[[i, j]];
                if c == 0 {
                    i += 1;
                    continue;
                }
                let color = palette(c as f64 / max as f64);
                let start = i;
                while i < nx && grid[[i, j]] > 0 && palette(grid[[i, j]] as f64 / max as f64) == color {
                    i += 1;
                }
                let x = frame.left + start as f64 * cell_w;
                s.fill_rect(x, y, (i - start) as f64 * cell_w, cell_h, color);
            }
        }
    }
    frame.draw_axes(s, title, x_label, y_label);

    // Colour scale.
    let bar_x = frame.left + frame.width + 15.0;
    let steps = 100;
    for k in 0..steps {
        let t = k as f64 / (steps - 1) as f64;
        let y = frame.top + frame.height * (1.0 - (k + 1) as f64 / steps as f64);
        s.fill_rect(bar_x, y, 18.0, frame.height / steps as f64 + 0.5, palette(t));
    }
    s.text(bar_x + 20.0, frame.top + 4.0, 11.0, Anchor::Start, &count_with_commas(max));
    s.text(bar_x + 20.0, frame.top + frame.height, 11.0, Anchor::Start, "0");
}

/// Profile points with error bars, drawn inside `y_range`.
pub fn draw_profile(s: &mut dyn Surface, p: &Profile, y_range: (f64, f64), title: &str) {
    let frame = Frame::new(s.size(), MARGIN_RIGHT, (p.axis.min, p.axis.max), y_range);
    let half_bin = frame.width / p.axis.bins as f64 / 2.0;
    for (x, mean, err) in p.points() {
        if !frame.contains_y(mean) {
            continue;
        }
        let px = frame.px(x);
        let lo = frame.py((mean - err).max(y_range.0));
        let hi = frame.py((mean + err).min(y_range.1));
        let py = frame.py(mean);
        s.line(px, lo, px, hi, BLUE, 1.0);
        s.line(px - half_bin, py, px + half_bin, py, BLUE, 1.0);
        s.marker(px, py, 1.5, BLUE);
    }
    frame.draw_axes(s, title, "bunch crossing", "mean cluster charge [ADC]");
}

/// Normalised sample histogram with the model density on top.
pub fn draw_density_overlay(s: &mut dyn Surface, overlay: &DensityOverlay, x_range: (f64, f64)) {
    let peak = overlay
        .curve
        .iter()
        .map(|&(_, d)| d)
        .chain(overlay.histogram.iter().map(|&(_, d)| d))
        .fold(0.0f64, f64::max);
    let y_max = if peak > 0.0 { peak * 1.15 } else { 1.0 };
    let frame = Frame::new(s.size(), MARGIN_RIGHT, x_range, (0.0, y_max));

    let bins = overlay
        .histogram
        .iter()
        .map(|&(lo, d)| (lo, lo + overlay.bin_width, d));
    s.polyline(&step_outline(&frame, bins), BLUE, 1.5);

    let curve: Vec<(f64, f64)> = thin(&overlay.curve, MAX_CURVE_POINTS)
        .into_iter()
        .map(|(x, d)| (frame.px(x), frame.py(d)))
        .collect();
    s.polyline(&curve, RED, 1.5);

    frame.draw_axes(s, "Charge sampler", "cluster charge [ADC]", "probability density");
    let x = frame.left + frame.width - 10.0;
    s.text(x, frame.top + 20.0, 12.0, Anchor::End, &overlay.label);
    s.text(
        x,
        frame.top + 36.0,
        12.0,
        Anchor::End,
        &format!("{} samples", count_with_commas(overlay.samples.len() as u64)),
    );
}
