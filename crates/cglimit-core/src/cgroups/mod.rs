//! Cgroup limit resolution
//!
//! Computes the limit actually enforced on a cgroup: the strictest value of a
//! control file between the cgroup and the root of its hierarchy. Works with
//! both cgroup v1 (one mount per controller) and cgroup v2 (unified mount).
//!
//! Nothing here writes to the cgroup filesystem.

pub mod catalog;
pub mod error;
pub mod limit;
pub mod membership;
pub mod mounts;
pub mod resolver;
pub mod subject;

pub use catalog::{Control, ControlCatalog, Hierarchy, BUILTIN_CONTROLS, UNIFIED_CONTROLLER};
pub use error::{CgroupError, Result};
pub use limit::{LimitValue, Sentinel};
pub use resolver::{hierarchy_chain, EffectiveLimitResolver, Resolution, Resolver, TraceStep};
pub use subject::{Subject, SubjectResolver};
