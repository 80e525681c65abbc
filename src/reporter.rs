use crate::{
    config::Config,
    forge::{CommitState, StatusSink},
    policy::Outcome,
    report::DefectReport,
};
use serde::Serialize;
use tracing::{info, warn};

/// What gets posted for one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub state: CommitState,
    pub description: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Delivered {
    pub status: bool,
    pub comment: bool,
}

pub fn render(cfg: &Config, outcome: Outcome, report: &DefectReport, target_url: &str) -> Delivery {
    let t = &cfg.thresholds;
    let n = report.outstanding.unwrap_or(0);
    let detail = || {
        Some(comment_body(
            cfg,
            outcome,
            report,
            target_url,
            &format!("{} outstanding defects.", n),
        ))
    };

    match outcome {
        Outcome::Skip => Delivery {
            state: CommitState::Success,
            description: "Skipped. No C/C++ changes in scope or the defect report was unavailable."
                .into(),
            comment: None,
        },
        Outcome::Success => Delivery {
            state: CommitState::Success,
            description: "Successfully passed. No outstanding defects.".into(),
            comment: None,
        },
        Outcome::GreenCard => Delivery {
            state: CommitState::Success,
            description: format!("Green card: {n} defects (limit {}).", t.yellow_card),
            comment: if cfg.reporter.comment_on_green_card {
                detail()
            } else {
                None
            },
        },
        Outcome::YellowCard => Delivery {
            state: CommitState::Success,
            description: format!(
                "Yellow card: {n} defects exceed {} (red card at {}).",
                t.yellow_card, t.red_card
            ),
            comment: detail(),
        },
        Outcome::RedCard => Delivery {
            state: CommitState::Success,
            description: format!("Red card (advisory): {n} defects exceed {}.", t.red_card),
            comment: detail(),
        },
        Outcome::Critical => Delivery {
            state: CommitState::Failure,
            description: format!("Critical: {n} defects exceed the red card limit {}.", t.red_card),
            comment: detail(),
        },
    }
}

/// Posts the status, then the comment. Failures are logged; the run goes on.
pub fn deliver(
    cfg: &Config,
    sink: &dyn StatusSink,
    delivery: &Delivery,
    target_url: &str,
) -> Delivered {
    let mut done = Delivered::default();

    match sink.report(
        delivery.state,
        &cfg.reporter.context,
        &delivery.description,
        target_url,
    ) {
        Ok(()) => {
            info!("status {}: {}", delivery.state.as_str(), delivery.description);
            done.status = true;
        }
        Err(err) => warn!("status delivery failed: {err:#}"),
    }

    if let Some(body) = &delivery.comment {
        match sink.comment(body) {
            Ok(()) => done.comment = true,
            Err(err) => warn!("comment delivery failed: {err:#}"),
        }
    }
    done
}

fn comment_body(
    cfg: &Config,
    outcome: Outcome,
    report: &DefectReport,
    target_url: &str,
    headline: &str,
) -> String {
    let mut s = String::new();
    s.push_str(&format!(":octocat: **cibot**: {} {headline}\n\n", card_title(outcome)));
    s.push_str(&defect_icons(cfg, report.outstanding.unwrap_or(0)));
    s.push_str("\n\n");
    s.push_str(&defect_table(report));
    if !target_url.is_empty() {
        s.push_str(&format!("\nDetails: {target_url}\n"));
    }
    s.push_str(&format!(
        "\nThresholds: yellow card > {}, red card > {}.\n",
        cfg.thresholds.yellow_card, cfg.thresholds.red_card
    ));
    s
}

fn card_title(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::GreenCard => ":green_heart: Green card.",
        Outcome::YellowCard => ":yellow_heart: Yellow card.",
        Outcome::RedCard => ":red_circle: Red card.",
        Outcome::Critical => ":no_entry: Critical.",
        Outcome::Skip | Outcome::Success => "",
    }
}

pub fn defect_table(report: &DefectReport) -> String {
    fn text(v: &Option<String>) -> String {
        v.clone().unwrap_or_else(|| "unknown".into())
    }
    fn count(v: &Option<u64>) -> String {
        v.map(|n| n.to_string()).unwrap_or_else(|| "unknown".into())
    }

    let rows = [
        ("Last Analyzed", text(&report.last_analyzed)),
        ("Lines of Code Analyzed", count(&report.lines_of_code_analyzed)),
        ("Defect Density", text(&report.defect_density)),
        ("Outstanding", count(&report.outstanding)),
        ("Fixed", count(&report.fixed)),
        ("Newly Detected", count(&report.newly_detected)),
        ("Eliminated", count(&report.eliminated)),
    ];

    let mut s = String::from("| Item | Value |\n|---|---|\n");
    for (k, v) in rows {
        s.push_str(&format!("| {k} | {v} |\n"));
    }
    s
}

/// One icon per defect: the first tier up to the yellow threshold, the second
/// tier beyond it, capped at `reporter.max_icons`.
pub fn defect_icons(cfg: &Config, outstanding: u64) -> String {
    let yellow = cfg.thresholds.yellow_card;
    let shown = outstanding.min(cfg.reporter.max_icons as u64);

    let mut s = String::new();
    for i in 1..=shown {
        if i <= yellow {
            s.push_str(&cfg.reporter.green_icon);
        } else {
            s.push_str(&cfg.reporter.red_icon);
        }
    }
    if outstanding > shown {
        s.push_str(&format!(" (+{})", outstanding - shown));
    }
    s
}
