//! Error types for limit resolution

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Limit resolution errors
///
/// Every variant is fatal. A control file missing at one hierarchy level is
/// not an error and never shows up here.
#[derive(Debug, Error)]
pub enum CgroupError {
    #[error("Unsupported control: {0}")]
    UnsupportedControl(String),

    #[error("Process not found: {0}")]
    ProcessNotFound(u64),

    #[error("Cgroup of process {pid} unavailable: {reason}")]
    ProcessCgroupUnavailable { pid: u64, reason: String },

    #[error("Mount lookup failed: {0}")]
    MountLookupFailed(String),

    #[error("Cgroup not found: {}", .0.display())]
    CgroupNotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    ControlReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot compare value {value:?} from {}", path.display())]
    ComparisonFailed { path: PathBuf, value: String },
}

impl CgroupError {
    /// Process exit code reported for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CgroupError::UnsupportedControl(_) => 1,
            CgroupError::ProcessNotFound(_) | CgroupError::ProcessCgroupUnavailable { .. } => 3,
            CgroupError::MountLookupFailed(_) => 4,
            CgroupError::CgroupNotFound(_) => 5,
            CgroupError::ControlReadFailed { .. } => 6,
            CgroupError::ComparisonFailed { .. } => 7,
        }
    }
}

pub type Result<T> = std::result::Result<T, CgroupError>;
