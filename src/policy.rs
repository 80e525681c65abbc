use crate::config::Thresholds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Skip,
    Success,
    GreenCard,
    YellowCard,
    RedCard,
    Critical,
}

/// Card for an outstanding-defect count. `None` (report unreadable or nothing
/// in scope) is `Skip`. Thresholds are assumed ordered; `Config::validate`
/// enforces that.
pub fn classify(outstanding: Option<u64>, thresholds: &Thresholds) -> Outcome {
    match outstanding {
        None => Outcome::Skip,
        Some(0) => Outcome::Success,
        Some(n) if n <= thresholds.yellow_card => Outcome::GreenCard,
        Some(n) if n <= thresholds.red_card => Outcome::YellowCard,
        Some(_) => Outcome::RedCard,
    }
}

impl Outcome {
    /// Reporting-layer view: a red card fails the check when escalation is on.
    pub fn escalated(self, escalate_red_card: bool) -> Self {
        match self {
            Outcome::RedCard if escalate_red_card => Outcome::Critical,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Skip => "skip",
            Outcome::Success => "success",
            Outcome::GreenCard => "green_card",
            Outcome::YellowCard => "yellow_card",
            Outcome::RedCard => "red_card",
            Outcome::Critical => "critical",
        }
    }
}
