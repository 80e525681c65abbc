use crate::config::{Config, Scan};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Files touched between `base` and `head`, as reported by git.
pub fn changed_files(cfg: &Config, project_dir: &Path, base: &str, head: &str) -> Result<Vec<String>> {
    let range = format!("{base}...{head}");
    let out = Command::new(&cfg.scan.git_exe)
        .args(["diff", "--name-only", &range])
        .current_dir(project_dir)
        .output()
        .with_context(|| format!("spawning {} diff", cfg.scan.git_exe))?;

    if !out.status.success() {
        return Err(anyhow!(
            "git diff {range} failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        ));
    }

    let files: Vec<String> = String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    debug!("{} files changed in {range}", files.len());
    Ok(files)
}

pub fn in_scope(scan: &Scan, path: &str) -> bool {
    let is_source = scan
        .source_suffixes
        .iter()
        .any(|s| path.ends_with(s.as_str()));
    let excluded = scan
        .excluded_prefixes
        .iter()
        .any(|p| path.starts_with(p.as_str()));
    is_source && !excluded
}

/// The changed file that triggers the scan. One is enough: the analyzer
/// always covers the whole tree.
pub fn select_scan_target<'a>(scan: &Scan, files: &'a [String]) -> Option<&'a str> {
    files
        .iter()
        .map(String::as_str)
        .find(|f| in_scope(scan, f))
}
