// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Bunch crossings per LHC orbit.
pub const N_BX_IN_ORBIT: usize = 3564;

/// Orbits per lumisection used by default, 2^10.
/// A full CMS lumisection is 2^18 orbits (about 23.36 s).
pub const N_ORBITS_IN_LUMISECTION: u32 = 1 << 10;

/// Bunch spacing [s]. Fixed by the machine.
pub const BUNCH_SPACING_S: f64 = 25.0e-9;

/// Default most-probable value of the cluster-charge distribution [ADC].
pub const CHARGE_MPV: f64 = 150.0;

/// Default width of the cluster-charge distribution [ADC].
pub const CHARGE_WIDTH: f64 = 20.0;

/// Lumisection duration [s] for a given orbit structure.
pub fn lumisection_duration_s(orbits_per_ls: u32, n_bx_in_orbit: usize, bunch_spacing_s: f64) -> f64 {
    orbits_per_ls as f64 * n_bx_in_orbit as f64 * bunch_spacing_s
}
