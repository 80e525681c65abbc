use crate::{
    config::Config,
    extract::{parse_count, Direction, ReportPage},
    policy::Outcome,
    quota::QuotaState,
    util::write_with_parent,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const LABEL_LAST_ANALYZED: &str = "Last Analyzed";
pub const LABEL_LINES_OF_CODE: &str = "Lines of Code Analyzed";
pub const LABEL_DEFECT_DENSITY: &str = "Defect Density";
pub const LABEL_OUTSTANDING: &str = "Outstanding";
pub const LABEL_FIXED: &str = "Fixed";
pub const LABEL_NEWLY_DETECTED: &str = "Newly Detected";
pub const LABEL_ELIMINATED: &str = "Eliminated";
pub const LABEL_LAST_BUILD: &str = "Last build analyzed";

/// Statistics scraped from the hosted project page. Every field is optional:
/// a missing label means unknown, not zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectReport {
    pub last_analyzed: Option<String>,
    pub lines_of_code_analyzed: Option<u64>,
    pub defect_density: Option<String>,
    pub outstanding: Option<u64>,
    pub fixed: Option<u64>,
    pub newly_detected: Option<u64>,
    pub eliminated: Option<u64>,
    pub last_build_analyzed: Option<String>,
}

impl DefectReport {
    pub fn from_html(html: &str) -> Self {
        Self::from_page(&ReportPage::parse(html))
    }

    pub fn from_page(page: &ReportPage) -> Self {
        let text = |label: &str| page.field(label, Direction::Before).filter(|s| !s.is_empty());
        let count = |label: &str| text(label).as_deref().and_then(parse_count);

        Self {
            last_analyzed: text(LABEL_LAST_ANALYZED),
            lines_of_code_analyzed: count(LABEL_LINES_OF_CODE),
            defect_density: text(LABEL_DEFECT_DENSITY),
            outstanding: count(LABEL_OUTSTANDING),
            fixed: count(LABEL_FIXED),
            newly_detected: count(LABEL_NEWLY_DETECTED),
            eliminated: count(LABEL_ELIMINATED),
            last_build_analyzed: page
                .field(LABEL_LAST_BUILD, Direction::After)
                .filter(|s| !s.is_empty()),
        }
    }
}

/// Badge JSON in the shields.io endpoint shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub schema_version: u32,
    pub label: String,
    pub message: String,
    pub color: String,
    pub style: String,
}

impl Badge {
    pub fn new(cfg: &Config, outstanding: Option<u64>) -> Self {
        let message = match outstanding {
            Some(n) => format!("{n} defects"),
            None => "unknown".to_string(),
        };
        Self {
            schema_version: 1,
            label: cfg.badge.label.clone(),
            message,
            color: cfg.badge.color.clone(),
            style: cfg.badge.style.clone(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_with_parent(path, serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub scan_target: Option<String>,
    pub quota: Option<QuotaState>,
    pub scan: ScanStatus,
    pub upload_ok: Option<bool>,
    pub report: DefectReport,
    pub outcome: Outcome,
    pub status_delivered: bool,
    pub comment_delivered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    NoSourcesInScope,
    ReportUnavailable,
    QuotaFull,
    UnsupportedBuild,
    Failed,
    Submitted,
}
