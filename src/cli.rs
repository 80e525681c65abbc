use crate::{
    changes::changed_files,
    config::Config,
    engine::{coverity::CoverityAnalyzer, BuildAnalyzer},
    forge::{GitHubSink, LogSink, StatusSink},
    pipeline::{Pipeline, RunContext},
    policy::classify,
    quota,
    report::DefectReport,
    service::CoverityScan,
    util::{ensure_dir, write_with_parent},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "cov-check")]
#[command(about = "Coverity Scan gate for pull requests (instrumented build + quota + defect cards)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./cov-check.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the analyzer tools are runnable.
    Doctor {},
    /// Print the statistics parsed from a saved report page.
    Extract {
        #[arg(long)]
        report: PathBuf,
    },
    /// Evaluate a "Last build analyzed" text against the quota limit.
    Quota {
        #[arg(long)]
        last_build: String,
        #[arg(long)]
        lines_of_code: Option<u64>,
    },
    /// Classify an outstanding-defect count against the configured cards.
    Classify {
        #[arg(long)]
        outstanding: Option<u64>,
    },
    /// Run the full gate for a pull request.
    Run {
        /// Base revision of the commit range.
        #[arg(long, required_unless_present = "files")]
        base: Option<String>,
        /// Head revision of the commit range.
        #[arg(long, default_value = "HEAD")]
        head: String,
        /// Changed files, instead of asking git.
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        files: Vec<String>,
        #[arg(long, default_value = "")]
        statuses_url: String,
        #[arg(long, default_value = "")]
        comments_url: String,
        #[arg(long, default_value = "")]
        target_url: String,
        /// Log status and comment instead of posting them.
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref())?;
    let cfg = Config::load(&cfg_path)?;
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Extract { report } => extract(report),
        Command::Quota {
            last_build,
            lines_of_code,
        } => {
            let limit = quota::limit_hours(&cfg, *lines_of_code);
            let state = quota::evaluate(last_build, limit);
            println!("{}", serde_json::to_string_pretty(&state)?);
            Ok(())
        }
        Command::Classify { outstanding } => {
            let outcome = classify(*outstanding, &cfg.thresholds)
                .escalated(cfg.reporter.escalate_red_card);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "outstanding": outstanding,
                    "thresholds": cfg.thresholds,
                    "outcome": outcome,
                }))?
            );
            Ok(())
        }
        Command::Run {
            base,
            head,
            files,
            statuses_url,
            comments_url,
            target_url,
            dry_run,
        } => {
            let project_dir = absolute(Path::new(&cfg.global.project_dir))?;
            let changed = if files.is_empty() {
                let base = base
                    .as_deref()
                    .ok_or_else(|| anyhow!("--base is required without --files"))?;
                changed_files(&cfg, &project_dir, base, head)?
            } else {
                files.clone()
            };
            let ctx = RunContext {
                work_dir: absolute(&project_dir.join(&cfg.paths.work_dir))?,
                project_dir,
                changed_files: changed,
                revision: head.clone(),
                target_url: target_url.clone(),
            };

            if *dry_run || cfg.global.dry_run {
                run(&cfg, &ctx, LogSink)
            } else {
                run(&cfg, &ctx, GitHubSink::new(&cfg, statuses_url, comments_url)?)
            }
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = user {
        return Ok(p.to_path_buf());
    }
    let default = PathBuf::from("cov-check.toml");
    if default.exists() {
        Ok(default)
    } else {
        Ok(PathBuf::from("cov-check.example.toml"))
    }
}

fn absolute(p: &Path) -> Result<PathBuf> {
    std::path::absolute(p).with_context(|| format!("absolute path of {}", p.display()))
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output (JSON); logs go to stderr.
    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn doctor(cfg: &Config) -> Result<()> {
    let analyzer = CoverityAnalyzer::new(cfg);
    let diag = analyzer.doctor()?;
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn extract(report: &Path) -> Result<()> {
    let html = std::fs::read_to_string(report)
        .with_context(|| format!("reading report: {}", report.display()))?;
    let parsed = DefectReport::from_html(&html);
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

fn run<K: StatusSink>(cfg: &Config, ctx: &RunContext, sink: K) -> Result<()> {
    info!(
        "project={} changed_files={} revision={}",
        ctx.project_dir.display(),
        ctx.changed_files.len(),
        ctx.revision
    );

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(&cfg.redacted())
            .with_context(|| "serializing effective config")?;
        write_with_parent(&Path::new(&cfg.paths.out_dir).join("effective-config.toml"), raw)?;
    }

    let pipeline = Pipeline::new(
        cfg,
        CoverityAnalyzer::new(cfg),
        CoverityScan::new(cfg)?,
        sink,
    );
    let summary = pipeline.run(ctx)?;

    write_with_parent(
        &Path::new(&cfg.paths.out_dir).join("summary.json"),
        serde_json::to_string_pretty(&summary)?,
    )?;

    if cfg.global.print_summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    Some(PathBuf::from(&cfg.paths.out_dir).join("cov-check.log"))
}
