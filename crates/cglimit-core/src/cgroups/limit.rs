//! Limit values read from control files

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use super::error::{CgroupError, Result};

/// Keyword meaning "no limit"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentinel {
    /// cgroup v2 spelling
    Max,
    /// Legacy spelling
    Infinity,
}

impl Sentinel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentinel::Max => "max",
            Sentinel::Infinity => "infinity",
        }
    }

    fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "max" => Some(Sentinel::Max),
            "infinity" => Some(Sentinel::Infinity),
            _ => None,
        }
    }
}

/// Value of a control at one hierarchy level, or the running result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum LimitValue {
    /// A configured limit; `0` is a real limit
    Finite(u64),
    /// Explicitly configured as unlimited
    Unbounded(Sentinel),
    /// Nothing configured (no control file)
    #[default]
    Absent,
}

impl LimitValue {
    /// Parse the content of a control file
    ///
    /// Surrounding whitespace is ignored. Sentinels must match exactly and
    /// numbers must be plain decimal digits (no sign).
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let trimmed = content.trim();

        if let Some(sentinel) = Sentinel::from_keyword(trimmed) {
            return Ok(LimitValue::Unbounded(sentinel));
        }

        let comparison_failed = || CgroupError::ComparisonFailed {
            path: path.to_path_buf(),
            value: trimmed.to_string(),
        };

        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(comparison_failed());
        }

        trimmed
            .parse::<u64>()
            .map(LimitValue::Finite)
            .map_err(|_| comparison_failed())
    }

    /// The finite limit, if any
    pub fn finite(&self) -> Option<u64> {
        match self {
            LimitValue::Finite(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, LimitValue::Absent)
    }

    /// Compare how restrictive two values are
    ///
    /// `Less` means `self` is stricter. Finite values order numerically and
    /// are always stricter than a sentinel or absence; sentinels and absence
    /// tie with each other.
    pub fn strictness(&self, other: &LimitValue) -> Ordering {
        match (self.finite(), other.finite()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Fold the value read at the next level into the running result
    ///
    /// The stricter side wins. On a tie an absent accumulator takes the
    /// sentinel, so a level configured as unlimited is still reported.
    pub fn combine(self, next: LimitValue) -> LimitValue {
        match self.strictness(&next) {
            Ordering::Greater => next,
            Ordering::Equal if self.is_absent() => next,
            _ => self,
        }
    }
}

impl fmt::Display for LimitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitValue::Finite(value) => write!(f, "{}", value),
            LimitValue::Unbounded(sentinel) => f.write_str(sentinel.as_str()),
            LimitValue::Absent => f.write_str("missing"),
        }
    }
}
