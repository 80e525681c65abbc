//! Submission-frequency gate for the scan service.
//!
//! The service publishes "Last build analyzed: N days/hours ago". A new
//! submission is allowed only once the last one is older than the limit.

use crate::config::Config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgoUnit {
    Hour,
    Day,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    /// Amount and unit as read from the page; `None` when nothing usable was found.
    pub last_build_ago: Option<(i64, AgoUnit)>,
    pub limit_hours: u64,
    pub quota_full: bool,
}

/// Hours between allowed submissions. With LOC scaling enabled this follows
/// the service's per-size weekly caps (4/3/2/1 builds a day).
pub fn limit_hours(cfg: &Config, lines_of_code: Option<u64>) -> u64 {
    if !cfg.quota.scale_by_lines_of_code {
        return cfg.quota.limit_hours;
    }
    match lines_of_code {
        Some(loc) if loc < 100_000 => 6,
        Some(loc) if loc < 500_000 => 8,
        Some(loc) if loc < 1_000_000 => 12,
        Some(_) => 24,
        None => cfg.quota.limit_hours,
    }
}

pub fn evaluate(text: &str, limit_hours: u64) -> QuotaState {
    let limit = limit_hours as i64;
    let mut quota_full = true;
    let mut day_full = false;
    let mut last_build_ago = None;

    if text.contains("day") {
        let days = amount_before(text, "day");
        if let Some(n) = days {
            last_build_ago = Some((n, AgoUnit::Day));
        }
        match days {
            Some(n) if n > 0 && n.saturating_mul(24) > limit => quota_full = false,
            _ => {
                quota_full = true;
                day_full = true;
            }
        }
    }

    // The hour check may overwrite a "not full" day decision ("1 day, 2 hours ago").
    if !day_full && text.contains("hour") {
        let hours = amount_before(text, "hour");
        if let Some(n) = hours {
            last_build_ago = Some((n, AgoUnit::Hour));
        }
        quota_full = !matches!(hours, Some(n) if n > 0 && n > limit);
    }

    QuotaState {
        last_build_ago,
        limit_hours,
        quota_full,
    }
}

/// The integer right before `unit`, falling back to the leading integer.
fn amount_before(text: &str, unit: &str) -> Option<i64> {
    let head = &text[..text.find(unit)?];
    last_integer(head).or_else(|| leading_integer(text))
}

fn last_integer(s: &str) -> Option<i64> {
    s.split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .filter_map(|t| t.parse().ok())
        .last()
}

fn leading_integer(s: &str) -> Option<i64> {
    s.split_whitespace().next().and_then(|t| t.parse().ok())
}
