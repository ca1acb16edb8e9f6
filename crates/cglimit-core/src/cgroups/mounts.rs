//! Mount table parsing
//!
//! Reads the `/proc/mounts` format:
//! ```text
//! cgroup2 /sys/fs/cgroup cgroup2 rw,nosuid,nodev,noexec,relatime 0 0
//! cgroup /sys/fs/cgroup/memory cgroup rw,nosuid,nodev,noexec,relatime,memory 0 0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::catalog::Control;
use super::error::{CgroupError, Result};

/// One line of the mount table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub source: String,
    pub mount_point: PathBuf,
    pub fs_type: String,
    pub options: String,
}

/// Parse mount table content, skipping lines with too few fields
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let source = fields.next()?;
            let mount_point = fields.next()?;
            let fs_type = fields.next()?;
            let options = fields.next()?;

            Some(MountEntry {
                source: unescape(source),
                mount_point: PathBuf::from(unescape(mount_point)),
                fs_type: fs_type.to_string(),
                options: options.to_string(),
            })
        })
        .collect()
}

/// Decode the octal escapes the kernel uses for whitespace and backslashes
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1..i + 4).is_some_and(is_octal_escape) {
            let code = (bytes[i + 1] - b'0') * 64 + (bytes[i + 2] - b'0') * 8 + (bytes[i + 3] - b'0');
            out.push(code);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_escape(digits: &[u8]) -> bool {
    digits.len() == 3
        && (b'0'..=b'3').contains(&digits[0])
        && digits[1..].iter().all(|d| (b'0'..=b'7').contains(d))
}

/// Find where the hierarchy of `control` is mounted
pub fn find_mount_point(entries: &[MountEntry], control: &Control) -> Option<PathBuf> {
    entries
        .iter()
        .find(|entry| {
            control
                .hierarchy
                .matches_mount(&entry.source, &entry.fs_type, &entry.options)
        })
        .map(|entry| entry.mount_point.clone())
}

/// Read the mount table at `mount_table` and locate the mount of `control`
pub fn mount_point_for(mount_table: &Path, control: &Control) -> Result<PathBuf> {
    let content = fs::read_to_string(mount_table).map_err(|e| {
        CgroupError::MountLookupFailed(format!(
            "cannot read mount table {}: {}",
            mount_table.display(),
            e
        ))
    })?;

    let entries = parse_mounts(&content);
    debug!(
        "Parsed {} mount entries from {}",
        entries.len(),
        mount_table.display()
    );

    find_mount_point(&entries, control).ok_or_else(|| {
        CgroupError::MountLookupFailed(format!(
            "no {} mount for controller {} in {}",
            control.hierarchy.fs_type(),
            control.controller(),
            mount_table.display()
        ))
    })
}
