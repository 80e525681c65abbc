use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_YELLOW_CARD: &str = "COV_CHECK_YELLOW_CARD";
pub const ENV_RED_CARD: &str = "COV_CHECK_RED_CARD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub quota: Quota,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub scan: Scan,
    #[serde(default)]
    pub reporter: Reporter,
    #[serde(default)]
    pub forge: Forge,
    #[serde(default)]
    pub badge: Badge,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let mut cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Overlay values that CI jobs provide through the environment.
    ///
    /// Secrets are never read from the TOML file; the `*_env` fields only name
    /// the variables to look up.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(&self.service.token_env) {
            self.service.token = v;
        }
        if let Some(v) = lookup(&self.service.email_env) {
            self.service.email = v;
        }
        if let Some(v) = lookup(&self.forge.token_env) {
            self.forge.token = v;
        }
        if let Some(v) = lookup(ENV_YELLOW_CARD) {
            self.thresholds.yellow_card = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_YELLOW_CARD} is not a number: {v}"))?;
        }
        if let Some(v) = lookup(ENV_RED_CARD) {
            self.thresholds.red_card = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_RED_CARD} is not a number: {v}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.thresholds.yellow_card > self.thresholds.red_card {
            bail!(
                "thresholds.yellow_card ({}) must not exceed thresholds.red_card ({})",
                self.thresholds.yellow_card,
                self.thresholds.red_card
            );
        }
        if self.service.account.is_empty() || self.service.repo.is_empty() {
            bail!("service.account and service.repo must be set");
        }
        if self.scan.source_suffixes.is_empty() {
            bail!("scan.source_suffixes must not be empty");
        }
        Ok(())
    }

    /// Effective config with credentials blanked, for dumping next to logs.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if !cfg.service.token.is_empty() {
            cfg.service.token = "<redacted>".into();
        }
        if !cfg.forge.token.is_empty() {
            cfg.forge.token = "<redacted>".into();
        }
        cfg
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub project_dir: String,
    pub dry_run: bool,
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            project_dir: ".".into(),
            dry_run: false,
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub out_dir: String,
    pub work_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
            work_dir: ".cov-check-work".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub base_url: String,
    pub account: String,
    pub repo: String,
    /// `{base_url}`, `{account}` and `{repo}` are substituted.
    pub report_url_pattern: String,
    pub upload_url_pattern: String,
    pub token_env: String,
    pub email_env: String,
    pub http_timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}
impl Default for Service {
    fn default() -> Self {
        Self {
            base_url: "https://scan.coverity.com".into(),
            account: "".into(),
            repo: "".into(),
            report_url_pattern: "{base_url}/projects/{account}-{repo}".into(),
            upload_url_pattern: "{base_url}/builds?project={account}%2F{repo}".into(),
            token_env: "COVERITY_TOKEN".into(),
            email_env: "COVERITY_EMAIL".into(),
            http_timeout_seconds: 120,
            token: "".into(),
            email: "".into(),
        }
    }
}

impl Service {
    pub fn report_url(&self) -> String {
        self.expand(&self.report_url_pattern)
    }

    pub fn upload_url(&self) -> String {
        self.expand(&self.upload_url_pattern)
    }

    fn expand(&self, pattern: &str) -> String {
        pattern
            .replace("{base_url}", self.base_url.trim_end_matches('/'))
            .replace("{account}", &self.account)
            .replace("{repo}", &self.repo)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quota {
    pub limit_hours: u64,
    pub scale_by_lines_of_code: bool,
}
impl Default for Quota {
    fn default() -> Self {
        Self {
            limit_hours: 12,
            scale_by_lines_of_code: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub yellow_card: u64,
    pub red_card: u64,
}
impl Default for Thresholds {
    fn default() -> Self {
        Self {
            yellow_card: 10,
            red_card: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub source_suffixes: Vec<String>,
    pub excluded_prefixes: Vec<String>,
    pub cov_build_exe: String,
    pub tar_exe: String,
    pub git_exe: String,
    /// Empty means auto-detect from meson.build / CMakeLists.txt / Makefile.
    pub build_command: Vec<String>,
    pub intermediate_dir: String,
    pub archive_name: String,
    pub build_timeout_seconds: u64,
    pub keep_intermediates: bool,
}
impl Default for Scan {
    fn default() -> Self {
        Self {
            source_suffixes: vec![".c".into(), ".cc".into(), ".cpp".into(), ".c++".into()],
            excluded_prefixes: vec!["obsolete/".into(), "external/".into()],
            cov_build_exe: "cov-build".into(),
            tar_exe: "tar".into(),
            git_exe: "git".into(),
            build_command: vec![],
            intermediate_dir: "cov-int".into(),
            archive_name: "cov-int.tgz".into(),
            build_timeout_seconds: 0,
            keep_intermediates: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reporter {
    pub context: String,
    pub escalate_red_card: bool,
    pub comment_on_green_card: bool,
    pub max_icons: usize,
    pub green_icon: String,
    pub red_icon: String,
}
impl Default for Reporter {
    fn default() -> Self {
        Self {
            context: "CI/pr-audit-coverity".into(),
            escalate_red_card: true,
            comment_on_green_card: false,
            max_icons: 50,
            green_icon: ":bug:".into(),
            red_icon: ":beetle:".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forge {
    pub token_env: String,
    pub user_agent: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
}
impl Default for Forge {
    fn default() -> Self {
        Self {
            token_env: "GITHUB_TOKEN".into(),
            user_agent: "cov-check/0.1.0".into(),
            token: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub enabled: bool,
    pub path: String,
    pub label: String,
    pub color: String,
    pub style: String,
}
impl Default for Badge {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "out/badge/coverity.json".into(),
            label: "coverity".into(),
            color: "yellow".into(),
            style: "flat".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debug {
    pub keep_tool_stderr: bool,
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            keep_tool_stderr: true,
            dump_effective_config: true,
        }
    }
}
