// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Drawing Surfaces
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Minimal drawing surfaces: SVG text and PNG raster.
//!
//! Coordinates are pixels, origin top-left, y down. The raster surface has
//! no font rasteriser, so `text` is a no-op there.

use ccsim_types::error::{SimError, SimResult};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::fmt::Write as _;
use std::path::Path;

pub type Rgb8 = [u8; 3];

pub const WHITE: Rgb8 = [255, 255, 255];
pub const BLACK: Rgb8 = [0, 0, 0];
pub const GREY: Rgb8 = [200, 200, 200];
pub const BLUE: Rgb8 = [31, 78, 156];
pub const RED: Rgb8 = [200, 30, 30];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb8);
    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb8, width: f64);
    fn marker(&mut self, x: f64, y: f64, radius: f64, color: Rgb8);
    fn text(&mut self, x: f64, y: f64, size: f64, anchor: Anchor, text: &str);

    fn polyline(&mut self, points: &[(f64, f64)], color: Rgb8, width: f64) {
        for w in points.windows(2) {
            self.line(w[0].0, w[0].1, w[1].0, w[1].1, color, width);
        }
    }
}

fn hex(c: Rgb8) -> String {
    format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Accumulates SVG elements in a string.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: u32,
    height: u32,
    body: String,
}

impl SvgSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let mut s = SvgSurface {
            width,
            height,
            body: String::new(),
        };
        s.fill_rect(0.0, 0.0, width as f64, height as f64, WHITE);
        s
    }

    pub fn finish(self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
             viewBox=\"0 0 {w} {h}\" font-family=\"Helvetica, Arial, sans-serif\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }

    /// Polyline as a single `<polyline>` element.
    fn push_polyline(&mut self, points: &[(f64, f64)], color: Rgb8, width: f64) {
        let mut pts = String::with_capacity(points.len() * 16);
        for (i, (x, y)) in points.iter().enumerate() {
            if i > 0 {
                pts.push(' ');
            }
            let _ = write!(pts, "{x:.2},{y:.2}");
        }
        let _ = writeln!(
            self.body,
            "<polyline points=\"{pts}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\"/>",
            hex(color)
        );
    }
}

impl Surface for SvgSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb8) {
        let _ = writeln!(
            self.body,
            "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" fill=\"{}\"/>",
            hex(color)
        );
    }

    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb8, width: f64) {
        let _ = writeln!(
            self.body,
            "<line x1=\"{x0:.2}\" y1=\"{y0:.2}\" x2=\"{x1:.2}\" y2=\"{y1:.2}\" \
             stroke=\"{}\" stroke-width=\"{width}\"/>",
            hex(color)
        );
    }

    fn marker(&mut self, x: f64, y: f64, radius: f64, color: Rgb8) {
        let _ = writeln!(
            self.body,
            "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{radius}\" fill=\"{}\"/>",
            hex(color)
        );
    }

    fn text(&mut self, x: f64, y: f64, size: f64, anchor: Anchor, text: &str) {
        let anchor = match anchor {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        };
        let _ = writeln!(
            self.body,
            "<text x=\"{x:.2}\" y=\"{y:.2}\" font-size=\"{size}\" text-anchor=\"{anchor}\">{}</text>",
            escape_xml(text)
        );
    }

    fn polyline(&mut self, points: &[(f64, f64)], color: Rgb8, width: f64) {
        if points.len() >= 2 {
            self.push_polyline(points, color, width);
        }
    }
}

/// RGB raster backed by `image::RgbImage`.
#[derive(Debug, Clone)]
pub struct PngSurface {
    img: RgbImage,
}

impl PngSurface {
    pub fn new(width: u32, height: u32) -> Self {
        PngSurface {
            img: ImageBuffer::from_pixel(width, height, Rgb(WHITE)),
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.img
    }

    pub fn save(&self, path: &Path) -> SimResult<()> {
        self.img
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| SimError::Report(format!("{}: {e}", path.display())))
    }

    #[inline]
    fn put(&mut self, x: i64, y: i64, color: Rgb8) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, Rgb(color));
        }
    }
}

impl Surface for PngSurface {
    fn size(&self) -> (u32, u32) {
        self.img.dimensions()
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb8) {
        let (width, height) = self.img.dimensions();
        if w <= 0.0 || h <= 0.0 || x + w <= 0.0 || y + h <= 0.0 || x >= width as f64 || y >= height as f64 {
            return;
        }
        let x0 = x.round().clamp(0.0, width as f64) as u32;
        let y0 = y.round().clamp(0.0, height as f64) as u32;
        let x1 = (x + w).round().clamp(0.0, width as f64) as u32;
        let y1 = (y + h).round().clamp(0.0, height as f64) as u32;
        // Sub-pixel rectangles still cover one pixel.
        let x1 = if x1 == x0 && x0 < width { x0 + 1 } else { x1 };
        let y1 = if y1 == y0 && y0 < height { y0 + 1 } else { y1 };
        for py in y0..y1 {
            for px in x0..x1 {
                self.img.put_pixel(px, py, Rgb(color));
            }
        }
    }

    fn line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Rgb8, width: f64) {
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as i64;
        let half = ((width - 1.0) / 2.0).round().max(0.0) as i64;
        for k in 0..=steps {
            let t = k as f64 / steps as f64;
            let x = (x0 + t * (x1 - x0)).round() as i64;
            let y = (y0 + t * (y1 - y0)).round() as i64;
            for dy in -half..=half {
                for dx in -half..=half {
                    self.put(x + dx, y + dy, color);
                }
            }
        }
    }

    fn marker(&mut self, x: f64, y: f64, radius: f64, color: Rgb8) {
        let r = radius.ceil() as i64;
        let (cx, cy) = (x.round() as i64, y.round() as i64);
        for dy in -r..=r {
            for dx in -r..=r {
                if ((dx * dx + dy * dy) as f64) <= radius * radius {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    fn text(&mut self, _x: f64, _y: f64, _size: f64, _anchor: Anchor, _text: &str) {}
}
