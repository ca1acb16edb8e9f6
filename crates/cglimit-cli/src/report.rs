//! Text output for listing and verbose mode

use cglimit_core::{ControlCatalog, LimitValue, Resolution};
use colored::*;

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Supported controls grouped by hierarchy version
pub fn render_list(catalog: &ControlCatalog) -> String {
    let mut lines = Vec::new();

    for version in [1u8, 2] {
        lines.push(format!("cgroup v{}:", version).bold().to_string());
        for control in catalog.controls_of(version) {
            if version == 1 {
                lines.push(format!("  {} ({})", control.name, control.controller()));
            } else {
                lines.push(format!("  {}", control.name));
            }
        }
    }

    join_lines(lines)
}

fn running(value: &LimitValue) -> String {
    match value {
        LimitValue::Absent => "none".to_string(),
        other => other.to_string(),
    }
}

/// Mount point, starting cgroup, then one entry per visited level
pub fn render_verbose(resolution: &Resolution) -> String {
    let mut lines = vec![
        format!(
            "{} {}",
            "mount point:".cyan(),
            resolution.mount_point.display()
        ),
        format!("{} {}", "cgroup:".cyan(), resolution.start.display()),
    ];

    for step in &resolution.steps {
        lines.push(format!("{}: {}", step.path.display(), step.reading));
        lines.push(format!("  {} {}", "effective:".dimmed(), running(&step.effective)));
    }

    join_lines(lines)
}
