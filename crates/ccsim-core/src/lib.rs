// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cluster-charge and trigger-rate Monte-Carlo.
//!
//! Bunch fill → non-empty crossings → trigger simulator (with charge model)
//! → histogram aggregates.

pub mod bunch_fill;
pub mod charge;
pub mod histogram;
pub mod progress;
pub mod trigger;

pub use bunch_fill::{non_empty_slots, BunchCrossingSlot, BunchFill};
pub use charge::{ChargeModel, DensityOverlay, OverlayGrid};
pub use histogram::{Axis, ChargeHistograms, Histogram1D, Histogram2D, Profile};
pub use progress::{LogProgress, NoProgress, ProgressObserver, ProgressSchedule};
pub use trigger::{
    trigger_probability, weighted_trigger_probabilities, SimulationOutcome, TriggerSimulator,
};
