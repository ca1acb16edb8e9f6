//! cglimit Core Library
//!
//! Resolves the effective value of a cgroup limit for a process or a cgroup
//! path by walking the hierarchy up to the controller's mount point.

pub mod cgroups;
pub mod config;
pub mod error;

pub use cgroups::{
    CgroupError, Control, ControlCatalog, Hierarchy, LimitValue, Resolution, Resolver, Sentinel,
    Subject, SubjectResolver, TraceStep,
};
pub use config::Config;
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
