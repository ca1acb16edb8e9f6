//! Process cgroup membership (`/proc/<pid>/cgroup`)

use std::fs;
use std::path::Path;

use tracing::debug;

use super::catalog::Control;
use super::error::{CgroupError, Result};

/// One line of a membership record
///
/// Format: `hierarchy-id:controller-list:path`, e.g. `0::/user.slice` or
/// `9:memory:/docker/abc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipLine<'a> {
    pub hierarchy_id: &'a str,
    pub controllers: &'a str,
    pub path: &'a str,
}

/// Parse membership content, skipping malformed lines
///
/// Only the first two `:` separate fields; the path may contain more.
pub fn parse_membership(content: &str) -> Vec<MembershipLine<'_>> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, ':');
            Some(MembershipLine {
                hierarchy_id: parts.next()?,
                controllers: parts.next()?,
                path: parts.next()?,
            })
        })
        .collect()
}

/// Check if process exists under `proc_root`
pub fn process_exists(proc_root: &Path, pid: u64) -> bool {
    proc_root.join(pid.to_string()).exists()
}

/// Get the cgroup path of `pid` in the hierarchy of `control`
pub fn process_cgroup(proc_root: &Path, pid: u64, control: &Control) -> Result<String> {
    if !process_exists(proc_root, pid) {
        return Err(CgroupError::ProcessNotFound(pid));
    }

    let cgroup_file = proc_root.join(pid.to_string()).join("cgroup");
    let content =
        fs::read_to_string(&cgroup_file).map_err(|e| CgroupError::ProcessCgroupUnavailable {
            pid,
            reason: format!("cannot read {}: {}", cgroup_file.display(), e),
        })?;

    let line = parse_membership(&content)
        .into_iter()
        .find(|line| {
            control
                .hierarchy
                .matches_membership(line.hierarchy_id, line.controllers)
        })
        .ok_or_else(|| CgroupError::ProcessCgroupUnavailable {
            pid,
            reason: format!(
                "no cgroup v{} entry for controller {} in {}",
                control.version(),
                control.controller(),
                cgroup_file.display()
            ),
        })?;

    debug!("PID {} is in cgroup {}", pid, line.path);
    Ok(line.path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroups::catalog::ControlCatalog;
    use tempfile::TempDir;

    const HYBRID_RECORD: &str = r#"12:pids:/user.slice/user-1000.slice
9:memory:/user.slice/user-1000.slice/session-2.scope
4:cpu,cpuacct:/user.slice
1:name=systemd:/user.slice/user-1000.slice/session-2.scope
0::/user.slice/user-1000.slice/session-2.scope"#;

    fn fake_proc(pid: u64, record: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        let pid_dir = dir.path().join(pid.to_string());
        fs::create_dir_all(&pid_dir).unwrap();
        if let Some(record) = record {
            fs::write(pid_dir.join("cgroup"), record).unwrap();
        }
        dir
    }

    #[test]
    fn test_parse_membership() {
        let lines = parse_membership("0::/a:b\n3:cpu,cpuacct:/x\ngarbage\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            MembershipLine {
                hierarchy_id: "0",
                controllers: "",
                path: "/a:b",
            }
        );
        assert_eq!(lines[1].controllers, "cpu,cpuacct");
    }

    #[test]
    fn test_process_cgroup_unified() {
        let catalog = ControlCatalog::builtin();
        let proc_root = fake_proc(1234, Some(HYBRID_RECORD));

        let path = process_cgroup(proc_root.path(), 1234, catalog.get("memory.max").unwrap()).unwrap();
        assert_eq!(path, "/user.slice/user-1000.slice/session-2.scope");
    }

    #[test]
    fn test_process_cgroup_legacy() {
        let catalog = ControlCatalog::builtin();
        let proc_root = fake_proc(1234, Some(HYBRID_RECORD));

        let control = catalog.get("memory.limit_in_bytes").unwrap();
        let path = process_cgroup(proc_root.path(), 1234, control).unwrap();
        assert_eq!(path, "/user.slice/user-1000.slice/session-2.scope");
    }

    #[test]
    fn test_process_not_found() {
        let catalog = ControlCatalog::builtin();
        let proc_root = fake_proc(1, Some(HYBRID_RECORD));

        let err = process_cgroup(proc_root.path(), 999_999, catalog.get("memory.max").unwrap())
            .unwrap_err();
        assert!(matches!(err, CgroupError::ProcessNotFound(999_999)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_unreadable_record() {
        let catalog = ControlCatalog::builtin();
        let proc_root = fake_proc(77, None);

        let err =
            process_cgroup(proc_root.path(), 77, catalog.get("memory.max").unwrap()).unwrap_err();
        assert!(matches!(err, CgroupError::ProcessCgroupUnavailable { pid: 77, .. }));
    }

    #[test]
    fn test_no_matching_line() {
        let catalog = ControlCatalog::builtin();
        let proc_root = fake_proc(77, Some("0::/only-unified\n"));

        let control = catalog.get("memory.limit_in_bytes").unwrap();
        let err = process_cgroup(proc_root.path(), 77, control).unwrap_err();
        assert!(matches!(err, CgroupError::ProcessCgroupUnavailable { .. }));
        assert!(err.to_string().contains("controller memory"));
    }

    #[test]
    #[ignore] // Reads the real /proc of the host
    fn test_process_exists_real() {
        assert!(process_exists(Path::new("/proc"), u64::from(std::process::id())));
        assert!(!process_exists(Path::new("/proc"), 9_999_999));
    }
}
