// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Bunch Fill
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-bunch-crossing luminosity calendar of an LHC fill.
//!
//! Input is the WBM bunch-fill table exported as JSON: an object keyed by
//! the bunch-crossing index as a string ("0".."3563", any key order), each
//! value a record with at least a numeric `InitialLumi`.

use ccsim_types::error::{SimError, SimResult};
use serde_json::Value;
use std::path::Path;

/// Record field holding the initial per-bunch luminosity.
pub const INITIAL_LUMI_KEY: &str = "InitialLumi";

/// One bunch-crossing slot of the orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BunchCrossingSlot {
    pub index: usize,
    pub lumi: f64,
}

/// Initial luminosity of every slot of one orbit, indexed by bunch crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct BunchFill {
    lumi: Vec<f64>,
}

impl BunchFill {
    /// Read the calendar from a JSON file.
    /// An unreadable or unparsable file is reported as `InputNotFound`.
    pub fn from_path(path: impl AsRef<Path>, n_bx_in_orbit: usize) -> SimResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SimError::InputNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&contents).map_err(|e| SimError::InputNotFound {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?;
        Self::from_value(&value, n_bx_in_orbit)
    }

    pub fn from_json_str(contents: &str, n_bx_in_orbit: usize) -> SimResult<Self> {
        let value: Value = serde_json::from_str(contents)
            .map_err(|e| SimError::MalformedInput(format!("not valid JSON: {e}")))?;
        Self::from_value(&value, n_bx_in_orbit)
    }

    /// Build the length-`n_bx_in_orbit` sequence by indexed lookup.
    pub fn from_value(value: &Value, n_bx_in_orbit: usize) -> SimResult<Self> {
        let table = value.as_object().ok_or_else(|| {
            SimError::MalformedInput("top level must be an object keyed by bunch crossing".into())
        })?;

        let mut lumi = Vec::with_capacity(n_bx_in_orbit);
        for index in 0..n_bx_in_orbit {
            let record = table
                .get(&index.to_string())
                .ok_or(SimError::MissingSlot { index })?;
            let field = record.get(INITIAL_LUMI_KEY).ok_or_else(|| {
                SimError::MalformedInput(format!("bx {index}: no `{INITIAL_LUMI_KEY}` field"))
            })?;
            let value = field.as_f64().ok_or_else(|| {
                SimError::MalformedInput(format!(
                    "bx {index}: `{INITIAL_LUMI_KEY}` is not a number: {field}"
                ))
            })?;
            lumi.push(value);
        }
        Ok(BunchFill { lumi })
    }

    /// Wrap an explicit luminosity sequence.
    pub fn from_lumi(lumi: Vec<f64>) -> SimResult<Self> {
        if let Some((index, v)) = lumi.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::MalformedInput(format!(
                "bx {index}: luminosity must be finite, got {v}"
            )));
        }
        Ok(BunchFill { lumi })
    }

    pub fn len(&self) -> usize {
        self.lumi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lumi.is_empty()
    }

    pub fn lumi(&self) -> &[f64] {
        &self.lumi
    }

    pub fn non_empty_slots(&self) -> Vec<BunchCrossingSlot> {
        non_empty_slots(&self.lumi)
    }

    pub fn n_non_empty(&self) -> usize {
        self.lumi.iter().filter(|&&l| l > 0.0).count()
    }

    /// Fraction of the orbit's slots that carry colliding bunches.
    pub fn fraction_non_empty(&self) -> f64 {
        if self.lumi.is_empty() {
            return 0.0;
        }
        self.n_non_empty() as f64 / self.lumi.len() as f64
    }
}

/// Read a bunch-fill file into a plain luminosity sequence.
pub fn load(path: impl AsRef<Path>, n_bx_in_orbit: usize) -> SimResult<Vec<f64>> {
    Ok(BunchFill::from_path(path, n_bx_in_orbit)?.lumi)
}

/// Slots with luminosity > 0, in ascending bunch-crossing order.
pub fn non_empty_slots(fill: &[f64]) -> Vec<BunchCrossingSlot> {
    fill.iter()
        .enumerate()
        .filter(|(_, &lumi)| lumi > 0.0)
        .map(|(index, &lumi)| BunchCrossingSlot { index, lumi })
        .collect()
}
