// ─────────────────────────────────────────────────────────────────────
// Cluster Charge Sim — Error
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Bunch-fill input not found at {path}: {source}")]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Bunch-fill calendar has no entry for bunch crossing {index}")]
    MissingSlot { index: usize },

    #[error("Malformed bunch-fill input: {0}")]
    MalformedInput(String),

    #[error("Invalid trigger rate: {0}")]
    InvalidRate(String),

    #[error("Sampling error: {0}")]
    Sampling(String),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Run interrupted after {completed_ls} of {requested_ls} lumisections")]
    Interrupted { completed_ls: u32, requested_ls: u32 },

    #[error("Report emission failed: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
