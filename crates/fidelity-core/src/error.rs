use thiserror::Error;

use crate::preset::QualityRank;

/// Failures inside the fidelity subsystem.
///
/// None of these escape the public control surface (`apply_preset`,
/// `record_frame`, `DeviceProfiler::detect`); they are turned into a
/// warning plus a [`Diagnostic`](crate::diagnostics::Diagnostic) at the
/// point of use.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FidelityError {
    #[error("unknown quality preset '{0}'")]
    UnknownPreset(String),

    #[error("capability unavailable: {0}")]
    UnsupportedCapability(String),

    #[error("preset table has no entry for rank {0:?}")]
    IncompleteTable(QualityRank),

    #[error("preset {rank:?} has an out-of-range {field}")]
    InvalidPreset {
        rank: QualityRank,
        field: &'static str,
    },

    #[error("invalid adaptive tuning: {0}")]
    InvalidTuning(String),

    #[error("invalid frame time {0}ms")]
    InvalidFrameTime(f64),

    #[error("missing data for '{0}'")]
    MissingData(String),
}

pub type Result<T> = std::result::Result<T, FidelityError>;
