// ─────────────────────────────────────────────────────────────────────
// SCPN Accelerator Core — Error
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("pass method not defined: {0}")]
    PassMethodNotDefined(String),

    #[error("closed-orbit search did not converge after {iterations} iterations")]
    NewtonNotConverged { iterations: usize },

    #[error("kicktable lookup out of range: x={x}, y={y}")]
    KicktableOutOfRange { x: f64, y: f64 },

    #[error("kicktable handle {0} is not present in the accelerator registry")]
    MissingKicktable(usize),

    #[error("6-d closed orbit requires an active rf cavity")]
    CavityRequired,

    #[error("invalid element: {0}")]
    InvalidElement(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("flat file error at line {line}: {message}")]
    FlatFileError { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TrackResult<T> = Result<T, TrackError>;
