use thiserror::Error;

/// Why a `load` did not reach Playing.
///
/// Reported to observers; the controller falls back to Idle and stays usable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Load failed: {reason}")]
    Failed { reason: String },
    #[error("Load cancelled by media source")]
    Cancelled,
    #[error("Media source reported an unknown status")]
    UnknownStatus,
}
