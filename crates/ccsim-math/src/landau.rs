// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Landau Density
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Landau probability density.
//!
//! Rational approximation of CERNLIB G110 `DENLAN`, split into eight
//! regions of the reduced variable `v = (x - location) / scale`.
//! The density peaks at `v ≈ -0.22278`, not at `v = 0`.

/// Offset of the standard Landau maximum from the location parameter.
pub const LANDAU_MODE_OFFSET: f64 = -0.222_782_98;

const P1: [f64; 5] = [0.4259894875, -0.1249762550, 0.03984243700, -0.006298287635, 0.001511162253];
const Q1: [f64; 5] = [1.0, -0.3388260629, 0.09594393323, -0.01608042283, 0.003778942063];

const P2: [f64; 5] = [0.1788541609, 0.1173957403, 0.01488850518, -0.001394989411, 0.0001283617211];
const Q2: [f64; 5] = [1.0, 0.7428795082, 0.3153932961, 0.06694219548, 0.008790609714];

const P3: [f64; 5] = [0.1788544503, 0.09359161662, 0.006325387654, 0.00006611667319, -0.000002031049101];
const Q3: [f64; 5] = [1.0, 0.6097809921, 0.2560616665, 0.04746722384, 0.006957301675];

const P4: [f64; 5] = [0.9874054407, 118.6723273, 849.2794360, -743.7792444, 427.0262186];
const Q4: [f64; 5] = [1.0, 106.8615961, 337.6496214, 2016.712389, 1597.063511];

const P5: [f64; 5] = [1.003675074, 167.5702434, 4789.711289, 21217.86767, -22324.94910];
const Q5: [f64; 5] = [1.0, 156.9424537, 3745.310488, 9834.698876, 66924.28357];

const P6: [f64; 5] = [1.000827619, 664.9143136, 62972.92665, 475554.6998, -5743609.109];
const Q6: [f64; 5] = [1.0, 651.4101098, 56974.73333, 165917.4725, -2815759.939];

const A1: [f64; 3] = [0.04166666667, -0.01996527778, 0.02709538966];
const A2: [f64; 2] = [-1.845568670, -4.284640743];

/// 1/sqrt(2π).
const INV_SQRT_2PI: f64 = 0.3989422803;

#[inline]
fn ratio(p: &[f64; 5], q: &[f64; 5], t: f64) -> f64 {
    let num = p[0] + (p[1] + (p[2] + (p[3] + p[4] * t) * t) * t) * t;
    let den = q[0] + (q[1] + (q[2] + (q[3] + q[4] * t) * t) * t) * t;
    num / den
}

/// Standard Landau density φ(v).
pub fn landau_standard(v: f64) -> f64 {
    if v.is_nan() {
        return f64::NAN;
    }
    if v < -5.5 {
        let u = (v + 1.0).exp();
        if u < 1e-10 {
            return 0.0;
        }
        let ue = (-1.0 / u).exp();
        let us = u.sqrt();
        INV_SQRT_2PI * (ue / us) * (1.0 + (A1[0] + (A1[1] + A1[2] * u) * u) * u)
    } else if v < -1.0 {
        let u = (-v - 1.0).exp();
        (-u).exp() * u.sqrt() * ratio(&P1, &Q1, v)
    } else if v < 1.0 {
        ratio(&P2, &Q2, v)
    } else if v < 5.0 {
        ratio(&P3, &Q3, v)
    } else if v < 12.0 {
        let u = 1.0 / v;
        u * u * ratio(&P4, &Q4, u)
    } else if v < 50.0 {
        let u = 1.0 / v;
        u * u * ratio(&P5, &Q5, u)
    } else if v < 300.0 {
        let u = 1.0 / v;
        u * u * ratio(&P6, &Q6, u)
    } else {
        let u = 1.0 / (v - v * v.ln() / (v + 1.0));
        u * u * (1.0 + (A2[0] + A2[1] * u) * u)
    }
}

/// Landau density at `x` for a location and a positive scale.
/// Returns 0 for a non-positive scale.
pub fn landau_pdf(x: f64, location: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.0;
    }
    landau_standard((x - location) / scale) / scale
}
