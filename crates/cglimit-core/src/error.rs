use thiserror::Error;

use crate::cgroups::CgroupError;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cgroup(#[from] CgroupError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code; configuration problems count as usage errors
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Cgroup(e) => e.exit_code(),
            Error::Config(_) | Error::Io(_) => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("proc_root must be absolute".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Config error"));
        assert!(msg.contains("proc_root must be absolute"));
    }

    #[test]
    fn test_cgroup_error_is_transparent() {
        let err: Error = CgroupError::ProcessNotFound(4242).into();
        assert_eq!(err.to_string(), "Process not found: 4242");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        let msg = format!("{}", err);
        assert!(msg.contains("IO error"));
        assert!(msg.contains("file not found"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_result_type_err() {
        let result: Result<i32> = Err(Error::Config("test error".to_string()));
        assert!(result.is_err());

        if let Err(e) = result {
            assert!(format!("{}", e).contains("test error"));
        }
    }
}
