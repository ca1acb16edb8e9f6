//! Effective limit resolution
//!
//! A limit set on a cgroup can be tightened by any ancestor, so the value that
//! is actually enforced is the minimum over the chain from the starting cgroup
//! up to the mount point of its hierarchy:
//!
//! ```text
//! /sys/fs/cgroup/memory/app/worker/memory.limit_in_bytes   209715200
//! /sys/fs/cgroup/memory/app/memory.limit_in_bytes          missing
//! /sys/fs/cgroup/memory/memory.limit_in_bytes              99999744  <- effective
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, trace};

use super::catalog::{Control, ControlCatalog};
use super::error::{CgroupError, Result};
use super::limit::LimitValue;
use super::subject::{Subject, SubjectResolver};

/// One visited hierarchy level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    /// Control file examined
    pub path: PathBuf,

    /// Value read, or [`LimitValue::Absent`] if the file was missing
    pub reading: LimitValue,

    /// Running effective value after this level
    pub effective: LimitValue,
}

/// Outcome of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub control: &'static str,
    pub version: u8,
    pub mount_point: PathBuf,
    pub start: PathBuf,
    pub steps: Vec<TraceStep>,
    pub effective: LimitValue,
}

impl Resolution {
    /// Text to print as the result, `None` when nothing was configured
    pub fn rendered(&self) -> Option<String> {
        match self.effective {
            LimitValue::Absent => None,
            value => Some(value.to_string()),
        }
    }
}

/// Directories from `start` up to and including `mount_point`
///
/// Walks by dropping path segments. If `start` is not below `mount_point`
/// the walk ends at the filesystem root instead.
pub fn hierarchy_chain(start: &Path, mount_point: &Path) -> Vec<PathBuf> {
    let mut chain = Vec::new();

    for dir in start.ancestors() {
        chain.push(dir.to_path_buf());
        if dir == mount_point {
            break;
        }
    }

    chain
}

/// Read one control file
///
/// A missing file yields [`LimitValue::Absent`]; any other failure aborts.
/// The file is closed before this returns.
fn read_level(path: &Path) -> Result<LimitValue> {
    match fs::read_to_string(path) {
        Ok(content) => LimitValue::parse(&content, path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(LimitValue::Absent),
        Err(e) => Err(CgroupError::ControlReadFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Walks a hierarchy chain and folds the control values into a minimum
#[derive(Debug, Default, Clone, Copy)]
pub struct EffectiveLimitResolver;

impl EffectiveLimitResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `control` starting at `start`, stopping at `mount_point`
    pub fn resolve(&self, control: &Control, start: &Path, mount_point: &Path) -> Result<Resolution> {
        let mut effective = LimitValue::Absent;
        let mut steps = Vec::new();

        for dir in hierarchy_chain(start, mount_point) {
            let path = dir.join(control.name);
            let reading = read_level(&path)?;
            effective = effective.combine(reading);

            trace!("{}: {} (effective {})", path.display(), reading, effective);
            steps.push(TraceStep {
                path,
                reading,
                effective,
            });
        }

        debug!(
            "Resolved {} over {} levels: {}",
            control.name,
            steps.len(),
            effective
        );

        Ok(Resolution {
            control: control.name,
            version: control.version(),
            mount_point: mount_point.to_path_buf(),
            start: start.to_path_buf(),
            steps,
            effective,
        })
    }
}

/// Full pipeline: control lookup, mount point, starting directory, walk
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    catalog: ControlCatalog,
    subjects: SubjectResolver,
    limits: EffectiveLimitResolver,
}

impl Resolver {
    pub fn new(catalog: ControlCatalog, subjects: SubjectResolver) -> Self {
        Self {
            catalog,
            subjects,
            limits: EffectiveLimitResolver::new(),
        }
    }

    pub fn catalog(&self) -> &ControlCatalog {
        &self.catalog
    }

    /// Resolve the effective value of `control` for `subject`
    pub fn resolve(&self, control: &str, subject: &Subject) -> Result<Resolution> {
        let control = self.catalog.get(control)?;
        debug!(
            "Resolving {} (cgroup v{}, controller {}) for {}",
            control.name,
            control.version(),
            control.controller(),
            subject
        );

        let mount_point = self.subjects.mount_point_for(control)?;
        debug!("Mount point: {}", mount_point.display());

        let start = self
            .subjects
            .resolve_starting_directory(subject, control, &mount_point)?;

        self.limits.resolve(control, &start, &mount_point)
    }
}
