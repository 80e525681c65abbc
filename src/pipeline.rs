use crate::{
    build_plan::BuildPlan,
    changes::select_scan_target,
    config::Config,
    engine::{AnalysisRequest, BuildAnalyzer},
    forge::StatusSink,
    policy::{classify, Outcome},
    quota::{self, QuotaState},
    report::{Badge, DefectReport, RunSummary, ScanStatus},
    reporter,
    service::ScanService,
    util::now_rfc3339,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything one invocation needs, fixed before the pipeline starts.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub project_dir: PathBuf,
    pub work_dir: PathBuf,
    pub changed_files: Vec<String>,
    /// Commit under test; used as the submitted build's version.
    pub revision: String,
    pub target_url: String,
}

pub struct Pipeline<A: BuildAnalyzer, S: ScanService, K: StatusSink> {
    cfg: Config,
    analyzer: A,
    service: S,
    sink: K,
}

impl<A: BuildAnalyzer, S: ScanService, K: StatusSink> Pipeline<A, S, K> {
    pub fn new(cfg: &Config, analyzer: A, service: S, sink: K) -> Self {
        Self {
            cfg: cfg.clone(),
            analyzer,
            service,
            sink,
        }
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn run(&self, ctx: &RunContext) -> Result<RunSummary> {
        let Some(target) = select_scan_target(&self.cfg.scan, &ctx.changed_files) else {
            info!(
                "no C/C++ sources in scope among {} changed files",
                ctx.changed_files.len()
            );
            return Ok(self.finish(
                ctx,
                None,
                None,
                ScanStatus::NoSourcesInScope,
                None,
                DefectReport::default(),
            ));
        };
        info!("scan triggered by {target}");

        let report = match self.service.fetch_report_html() {
            Ok(html) => DefectReport::from_html(&html),
            Err(err) => {
                warn!("defect report unavailable: {err:#}");
                return Ok(self.finish(
                    ctx,
                    Some(target),
                    None,
                    ScanStatus::ReportUnavailable,
                    None,
                    DefectReport::default(),
                ));
            }
        };
        info!(
            "report outstanding={:?} loc={:?} last_build={:?}",
            report.outstanding, report.lines_of_code_analyzed, report.last_build_analyzed
        );

        let limit = quota::limit_hours(&self.cfg, report.lines_of_code_analyzed);
        let quota = quota::evaluate(
            report.last_build_analyzed.as_deref().unwrap_or_default(),
            limit,
        );

        let (scan, upload_ok) = if quota.quota_full {
            info!(
                "submission quota full (last build {:?}, limit {}h); skipping scan",
                report.last_build_analyzed, limit
            );
            (ScanStatus::QuotaFull, None)
        } else {
            self.scan_and_upload(ctx, target)
        };

        Ok(self.finish(ctx, Some(target), Some(quota), scan, upload_ok, report))
    }

    fn scan_and_upload(&self, ctx: &RunContext, target: &str) -> (ScanStatus, Option<bool>) {
        let build_dir = ctx.work_dir.join("build");
        let Some(plan) = BuildPlan::detect(&self.cfg, &ctx.project_dir, &build_dir) else {
            warn!(
                "unsupported build configuration in {}; not scanning",
                ctx.project_dir.display()
            );
            return (ScanStatus::UnsupportedBuild, None);
        };

        let req = AnalysisRequest {
            trigger_file: target.to_string(),
            project_dir: ctx.project_dir.clone(),
            work_dir: ctx.work_dir.clone(),
            plan,
            intermediate_dir: self.cfg.scan.intermediate_dir.clone(),
            archive_path: ctx.work_dir.join(&self.cfg.scan.archive_name),
        };

        let result = match self.analyzer.run(&req) {
            Ok(r) => r,
            Err(err) => {
                warn!("instrumented build failed: {err:#}");
                return (ScanStatus::Failed, None);
            }
        };
        for w in &result.warnings {
            warn!("analyzer: {w}");
        }
        let Some(archive) = result.archive.filter(|_| result.ok) else {
            return (ScanStatus::Failed, None);
        };

        let description = format!("cov-check {} ({})", target, now_rfc3339());
        match self.service.upload(&archive, &ctx.revision, &description) {
            Ok(()) => {
                info!("build submitted: {}", archive.display());
                (ScanStatus::Submitted, Some(true))
            }
            Err(err) => {
                warn!("build upload failed: {err:#}");
                (ScanStatus::Submitted, Some(false))
            }
        }
    }

    fn finish(
        &self,
        ctx: &RunContext,
        target: Option<&str>,
        quota: Option<QuotaState>,
        scan: ScanStatus,
        upload_ok: Option<bool>,
        report: DefectReport,
    ) -> RunSummary {
        let outstanding = match scan {
            ScanStatus::NoSourcesInScope => None,
            _ => report.outstanding,
        };
        let outcome: Outcome = classify(outstanding, &self.cfg.thresholds)
            .escalated(self.cfg.reporter.escalate_red_card);
        info!("outcome {}", outcome.as_str());

        let delivery = reporter::render(&self.cfg, outcome, &report, &ctx.target_url);
        let delivered = reporter::deliver(&self.cfg, &self.sink, &delivery, &ctx.target_url);

        // Written on every run; an absent count shows as "unknown".
        if self.cfg.badge.enabled {
            let path = Path::new(&self.cfg.badge.path);
            if let Err(err) = Badge::new(&self.cfg, outstanding).write(path) {
                warn!("badge not written: {err:#}");
            }
        }

        RunSummary {
            scan_target: target.map(str::to_string),
            quota,
            scan,
            upload_ok,
            report,
            outcome,
            status_delivered: delivered.status,
            comment_delivered: delivered.comment,
        }
    }
}
