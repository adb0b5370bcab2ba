// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Diagnostics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Run diagnostics.
//!
//! Summary block, thousands-separated counts, SVG/PNG rendering of the charge
//! histograms and profile, and artifact emission.

pub mod format;
pub mod plots;
pub mod report;
pub mod summary;
pub mod surface;

pub use format::int_with_commas;
pub use report::{emit, emit_density_overlay};
pub use summary::SummaryStats;
