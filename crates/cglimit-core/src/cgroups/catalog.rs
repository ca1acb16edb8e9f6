//! Registry of supported limit controls
//!
//! Pure data: adding a control means adding a row to [`BUILTIN_CONTROLS`].

use serde::Serialize;

use super::error::{CgroupError, Result};

/// Controller name reported for unified (v2) controls
pub const UNIFIED_CONTROLLER: &str = "unified";

/// Filesystem type of a v1 (legacy) hierarchy mount
pub const LEGACY_FS_TYPE: &str = "cgroup";

/// Filesystem type of the v2 (unified) hierarchy mount
pub const UNIFIED_FS_TYPE: &str = "cgroup2";

/// Hierarchy a control lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Hierarchy {
    /// cgroup v1: one mount per controller
    Legacy { controller: &'static str },
    /// cgroup v2: a single mount shared by every controller
    Unified,
}

impl Hierarchy {
    /// Hierarchy version (1 or 2)
    pub fn version(&self) -> u8 {
        match self {
            Hierarchy::Legacy { .. } => 1,
            Hierarchy::Unified => 2,
        }
    }

    /// Controller used to locate the mount point
    pub fn controller(&self) -> &'static str {
        match self {
            Hierarchy::Legacy { controller } => *controller,
            Hierarchy::Unified => UNIFIED_CONTROLLER,
        }
    }

    /// Filesystem type the hierarchy is mounted as
    pub fn fs_type(&self) -> &'static str {
        match self {
            Hierarchy::Legacy { .. } => LEGACY_FS_TYPE,
            Hierarchy::Unified => UNIFIED_FS_TYPE,
        }
    }

    /// Does a `/proc/<pid>/cgroup` line belong to this hierarchy?
    ///
    /// Unified lines look like `0::/path`; legacy lines list their
    /// controllers, e.g. `4:cpu,cpuacct:/path`.
    pub fn matches_membership(&self, hierarchy_id: &str, controllers: &str) -> bool {
        match self {
            Hierarchy::Legacy { controller } => contains_token(controllers, controller),
            Hierarchy::Unified => hierarchy_id == "0" && controllers.is_empty(),
        }
    }

    /// Does a mount table entry mount this hierarchy?
    pub fn matches_mount(&self, source: &str, fs_type: &str, options: &str) -> bool {
        if fs_type != self.fs_type() {
            return false;
        }

        match self {
            Hierarchy::Legacy { controller } => {
                contains_token(options, controller) || source == *controller
            }
            Hierarchy::Unified => true,
        }
    }
}

fn contains_token(list: &str, token: &str) -> bool {
    list.split(',').any(|item| item == token)
}

/// A supported limit control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Control {
    /// Name of the control file, e.g. `memory.max`
    pub name: &'static str,

    /// Hierarchy the control belongs to
    pub hierarchy: Hierarchy,
}

impl Control {
    pub const fn legacy(name: &'static str, controller: &'static str) -> Self {
        Self {
            name,
            hierarchy: Hierarchy::Legacy { controller },
        }
    }

    pub const fn unified(name: &'static str) -> Self {
        Self {
            name,
            hierarchy: Hierarchy::Unified,
        }
    }

    pub fn version(&self) -> u8 {
        self.hierarchy.version()
    }

    pub fn controller(&self) -> &'static str {
        self.hierarchy.controller()
    }
}

/// Controls known out of the box
pub const BUILTIN_CONTROLS: &[Control] = &[
    // cgroup v1
    Control::legacy("memory.limit_in_bytes", "memory"),
    Control::legacy("memory.memsw.limit_in_bytes", "memory"),
    Control::legacy("memory.soft_limit_in_bytes", "memory"),
    Control::legacy("memory.kmem.limit_in_bytes", "memory"),
    Control::legacy("memory.kmem.tcp.limit_in_bytes", "memory"),
    // cgroup v2
    Control::unified("memory.max"),
    Control::unified("memory.high"),
    Control::unified("memory.swap.max"),
    Control::unified("memory.zswap.max"),
    Control::unified("pids.max"),
    Control::unified("cgroup.max.depth"),
    Control::unified("cgroup.max.descendants"),
];

/// Read-only lookup over a static control table
#[derive(Debug, Clone, Copy)]
pub struct ControlCatalog {
    controls: &'static [Control],
}

impl Default for ControlCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ControlCatalog {
    /// Catalog over [`BUILTIN_CONTROLS`]
    pub const fn builtin() -> Self {
        Self::new(BUILTIN_CONTROLS)
    }

    pub const fn new(controls: &'static [Control]) -> Self {
        Self { controls }
    }

    /// Look up a control by name
    pub fn get(&self, name: &str) -> Result<&'static Control> {
        let controls: &'static [Control] = self.controls;
        controls
            .iter()
            .find(|control| control.name == name)
            .ok_or_else(|| CgroupError::UnsupportedControl(name.to_string()))
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    pub fn version_of(&self, name: &str) -> Result<u8> {
        Ok(self.get(name)?.version())
    }

    pub fn controller_of(&self, name: &str) -> Result<&'static str> {
        Ok(self.get(name)?.controller())
    }

    /// Controls of one hierarchy version, in table order
    pub fn controls_of(&self, version: u8) -> impl Iterator<Item = &'static Control> {
        let controls: &'static [Control] = self.controls;
        controls
            .iter()
            .filter(move |control| control.version() == version)
    }
}
