//! Turning a user-supplied subject into a starting cgroup directory

use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::catalog::Control;
use super::error::{CgroupError, Result};
use super::membership;
use super::mounts;
use crate::config::PathsConfig;

/// What the caller asked about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// A process id
    Pid(u64),
    /// A cgroup path, absolute or relative to the mount point
    Path(String),
}

impl Subject {
    /// Positive decimal integers are process ids; everything else is a path
    ///
    /// Only plain digits count, so `+42` is a path. Ids too large for `u64`
    /// saturate to `u64::MAX`, which no process can have.
    pub fn parse(raw: &str) -> Self {
        let is_decimal = !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit());
        if !is_decimal || raw.bytes().all(|b| b == b'0') {
            return Subject::Path(raw.to_string());
        }

        Subject::Pid(raw.parse::<u64>().unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Pid(pid) => write!(f, "pid {}", pid),
            Subject::Path(path) => f.write_str(path),
        }
    }
}

/// Lexically normalize a path
///
/// Drops `.` and empty segments and lets `..` pop one segment, never above
/// the root. Symlinks are not resolved.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(segment) => out.push(segment),
        }
    }

    out
}

/// Anchor a cgroup path under `mount_point`
///
/// Paths already under the mount point are kept; others are appended to it.
pub fn anchor(cgroup_path: &str, mount_point: &Path) -> PathBuf {
    let path = Path::new(cgroup_path);
    if path.starts_with(mount_point) {
        return normalize(path);
    }

    let relative = cgroup_path.trim_start_matches('/');
    normalize(&mount_point.join(relative))
}

/// Resolves mount points and starting directories from system data
#[derive(Debug, Clone)]
pub struct SubjectResolver {
    proc_root: PathBuf,
    mount_table: PathBuf,
}

impl Default for SubjectResolver {
    fn default() -> Self {
        Self::from_config(&PathsConfig::default())
    }
}

impl SubjectResolver {
    pub fn new(proc_root: impl Into<PathBuf>, mount_table: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            mount_table: mount_table.into(),
        }
    }

    pub fn from_config(paths: &PathsConfig) -> Self {
        Self::new(&paths.proc_root, &paths.mount_table)
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    pub fn mount_table(&self) -> &Path {
        &self.mount_table
    }

    /// Where the hierarchy of `control` is mounted
    pub fn mount_point_for(&self, control: &Control) -> Result<PathBuf> {
        mounts::mount_point_for(&self.mount_table, control)
    }

    /// Cgroup path of `pid` in the hierarchy of `control`
    pub fn cgroup_of_process(&self, pid: u64, control: &Control) -> Result<String> {
        membership::process_cgroup(&self.proc_root, pid, control)
    }

    /// Absolute directory the hierarchy walk starts from
    ///
    /// Fails with [`CgroupError::CgroupNotFound`] if the directory does not
    /// exist.
    pub fn resolve_starting_directory(
        &self,
        subject: &Subject,
        control: &Control,
        mount_point: &Path,
    ) -> Result<PathBuf> {
        let start = match subject {
            Subject::Pid(pid) => {
                let cgroup = self.cgroup_of_process(*pid, control)?;
                anchor(&cgroup, mount_point)
            }
            Subject::Path(path) => anchor(path, mount_point),
        };

        if !start.is_dir() {
            return Err(CgroupError::CgroupNotFound(start));
        }

        debug!("Starting directory for {}: {}", subject, start.display());
        Ok(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroups::catalog::ControlCatalog;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_subject_parse() {
        assert_eq!(Subject::parse("1234"), Subject::Pid(1234));
        assert_eq!(Subject::parse("0"), Subject::Path("0".to_string()));
        assert_eq!(Subject::parse("000"), Subject::Path("000".to_string()));
        assert_eq!(Subject::parse("-5"), Subject::Path("-5".to_string()));
        assert_eq!(Subject::parse("+42"), Subject::Path("+42".to_string()));
        assert_eq!(Subject::parse(""), Subject::Path(String::new()));
        assert_eq!(Subject::parse("007"), Subject::Pid(7));
        assert_eq!(
            Subject::parse("/user.slice"),
            Subject::Path("/user.slice".to_string())
        );
    }

    #[test]
    fn test_subject_parse_large_pid() {
        assert_eq!(Subject::parse("4294967296"), Subject::Pid(4_294_967_296));
        assert_eq!(
            Subject::parse("99999999999999999999999"),
            Subject::Pid(u64::MAX)
        );
    }

    #[test]
    fn test_large_pid_is_missing_process() {
        let catalog = ControlCatalog::builtin();
        let control = catalog.get("memory.max").unwrap();
        let proc_root = TempDir::new().unwrap();
        let mount = TempDir::new().unwrap();

        let resolver = SubjectResolver::new(proc_root.path(), "/proc/mounts");
        let err = resolver
            .resolve_starting_directory(&Subject::parse("4294967296"), control, mount.path())
            .unwrap_err();

        assert!(matches!(err, CgroupError::ProcessNotFound(4_294_967_296)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b//c/")), PathBuf::from("/a/b/c"));
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn test_anchor() {
        let mount = Path::new("/sys/fs/cgroup");

        assert_eq!(
            anchor("/user.slice/app", mount),
            PathBuf::from("/sys/fs/cgroup/user.slice/app")
        );
        assert_eq!(
            anchor("/sys/fs/cgroup/user.slice", mount),
            PathBuf::from("/sys/fs/cgroup/user.slice")
        );
        assert_eq!(anchor("/", mount), PathBuf::from("/sys/fs/cgroup"));
        assert_eq!(
            anchor("user.slice/./a/../b", mount),
            PathBuf::from("/sys/fs/cgroup/user.slice/b")
        );
    }

    #[test]
    fn test_anchor_is_component_prefix() {
        let mount = Path::new("/sys/fs/cgroup");
        assert_eq!(
            anchor("/sys/fs/cgroup2/x", mount),
            PathBuf::from("/sys/fs/cgroup/sys/fs/cgroup2/x")
        );
    }

    #[test]
    fn test_anchor_may_escape_mount() {
        let mount = Path::new("/sys/fs/cgroup");
        assert_eq!(anchor("/../..", mount), PathBuf::from("/sys"));
    }

    #[test]
    fn test_resolve_path_subject() {
        let catalog = ControlCatalog::builtin();
        let control = catalog.get("memory.max").unwrap();
        let mount = TempDir::new().unwrap();
        fs::create_dir_all(mount.path().join("a/b")).unwrap();

        let resolver = SubjectResolver::new("/proc", "/proc/mounts");
        let start = resolver
            .resolve_starting_directory(&Subject::parse("/a/b"), control, mount.path())
            .unwrap();
        assert_eq!(start, mount.path().join("a/b"));
    }

    #[test]
    fn test_resolve_missing_directory() {
        let catalog = ControlCatalog::builtin();
        let control = catalog.get("memory.max").unwrap();
        let mount = TempDir::new().unwrap();

        let resolver = SubjectResolver::new("/proc", "/proc/mounts");
        let err = resolver
            .resolve_starting_directory(&Subject::parse("/nope"), control, mount.path())
            .unwrap_err();

        assert!(matches!(err, CgroupError::CgroupNotFound(ref p) if *p == mount.path().join("nope")));
        assert_eq!(err.exit_code(), 5);
        assert!(err.to_string().contains(&mount.path().join("nope").display().to_string()));
    }

    #[test]
    fn test_resolve_pid_subject() {
        let catalog = ControlCatalog::builtin();
        let control = catalog.get("pids.max").unwrap();

        let proc_root = TempDir::new().unwrap();
        fs::create_dir_all(proc_root.path().join("42")).unwrap();
        fs::write(proc_root.path().join("42/cgroup"), "0::/system.slice/cron.service\n").unwrap();

        let mount = TempDir::new().unwrap();
        fs::create_dir_all(mount.path().join("system.slice/cron.service")).unwrap();

        let resolver = SubjectResolver::new(proc_root.path(), "/proc/mounts");
        let start = resolver
            .resolve_starting_directory(&Subject::Pid(42), control, mount.path())
            .unwrap();
        assert_eq!(start, mount.path().join("system.slice/cron.service"));
    }
}
