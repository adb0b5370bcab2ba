// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Progress
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Progress checkpoints of the lumisection/orbit loop.
//!
//! Observers only see checkpoints; they cannot change what is computed.

use std::time::Duration;

/// Receives progress checkpoints from the simulator.
pub trait ProgressObserver {
    /// Orbit checkpoint inside a lumisection.
    fn on_progress(&mut self, lumisection: u32, orbit: u32, elapsed: Duration);

    /// Start of a lumisection that falls on the lumisection schedule.
    /// Sequential runs only.
    fn on_lumisection(&mut self, _lumisection: u32, _elapsed: Duration) {}

    /// Lumisection folded into the run total, in lumisection order.
    /// Called by both the sequential and the parallel path.
    fn on_lumisection_done(&mut self, _lumisection: u32, _elapsed: Duration) {}
}

/// Discards every checkpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _lumisection: u32, _orbit: u32, _elapsed: Duration) {}
}

/// Where checkpoints fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSchedule {
    orbit_step: u32,
}

impl ProgressSchedule {
    /// Orbit checkpoints every `orbits_per_ls / divisor` orbits (at least every orbit).
    pub fn new(orbits_per_ls: u32, divisor: u32) -> Self {
        ProgressSchedule {
            orbit_step: (orbits_per_ls / divisor.max(1)).max(1),
        }
    }

    #[inline]
    pub fn is_orbit_checkpoint(&self, orbit: u32) -> bool {
        orbit % self.orbit_step == 0
    }

    /// Every 10 LS below 100, every 100 below 1000, every 500 after.
    pub fn is_lumisection_checkpoint(ls: u32) -> bool {
        (ls % 10 == 0 && ls < 100) || (ls % 100 == 0 && ls < 1000) || ls % 500 == 0
    }
}

/// Reports checkpoints through `log`.
/// Orbit checkpoints are `info` inside scheduled lumisections and `debug` elsewhere.
#[derive(Debug, Clone)]
pub struct LogProgress {
    run_duration_ls: u32,
    orbits_per_ls: u32,
}

impl LogProgress {
    pub fn new(run_duration_ls: u32, orbits_per_ls: u32) -> Self {
        LogProgress {
            run_duration_ls,
            orbits_per_ls,
        }
    }
}

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, lumisection: u32, orbit: u32, elapsed: Duration) {
        if ProgressSchedule::is_lumisection_checkpoint(lumisection) {
            log::info!(
                "\t# Processing orbit {} / {} (elapsed time: {:.3?})",
                orbit + 1,
                self.orbits_per_ls,
                elapsed
            );
        } else {
            log::debug!(
                "LS {} orbit {} / {} (elapsed time: {:.3?})",
                lumisection + 1,
                orbit + 1,
                self.orbits_per_ls,
                elapsed
            );
        }
    }

    fn on_lumisection(&mut self, lumisection: u32, elapsed: Duration) {
        log::info!(
            "# Processing lumi section {} / {} (elapsed time: {:.3?})",
            lumisection + 1,
            self.run_duration_ls,
            elapsed
        );
    }

    fn on_lumisection_done(&mut self, lumisection: u32, elapsed: Duration) {
        let level = if ProgressSchedule::is_lumisection_checkpoint(lumisection) {
            log::Level::Info
        } else {
            log::Level::Debug
        };
        log::log!(
            level,
            "# Lumi section {} / {} done (elapsed time: {:.3?})",
            lumisection + 1,
            self.run_duration_ls,
            elapsed
        );
    }
}
