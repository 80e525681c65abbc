use super::{types::*, BuildAnalyzer};
use crate::{config::Config, util::ensure_dir};
use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct CoverityAnalyzer {
    cfg: Config,
    cov_build: PathBuf,
    tar: PathBuf,
}

impl CoverityAnalyzer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            cfg: cfg.clone(),
            cov_build: expand_tilde(&cfg.scan.cov_build_exe),
            tar: expand_tilde(&cfg.scan.tar_exe),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        match self.cfg.scan.build_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    fn run_tool(&self, program: &Path, args: &[String], cwd: &Path) -> Result<Output> {
        debug!(
            "exec {} {} cwd={} timeout={:?}",
            program.display(),
            args.join(" "),
            cwd.display(),
            self.timeout()
        );
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.current_dir(cwd);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // Own process group, so a timeout takes make/ninja and the compilers down too.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {}", program.display()))?;

        let output = match self.timeout() {
            Some(timeout) => wait_with_timeout(&mut child, timeout)?,
            None => child
                .wait_with_output()
                .with_context(|| format!("waiting for {}", program.display()))?,
        };

        if self.cfg.debug.keep_tool_stderr && !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("{} stderr: {}", program.display(), stderr.trim());
        }
        Ok(output)
    }

    fn version_of(&self, program: &Path) -> Option<String> {
        let out = self
            .run_tool(program, &["--version".to_string()], Path::new("."))
            .ok()?;
        if !out.status.success() {
            return None;
        }
        String::from_utf8_lossy(&out.stdout)
            .lines()
            .next()
            .map(|l| l.trim().to_string())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

fn failure(program: &Path, output: &Output) -> anyhow::Error {
    anyhow!(
        "{} exited with {}\n{}",
        program.display(),
        output.status,
        String::from_utf8_lossy(&output.stderr).trim()
    )
}

/// Lines of cov-build's closing report, e.g. "123 C/C++ compilation units (100%) are ready for analysis".
pub fn summary_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| l.contains("compilation units") || l.starts_with("The cov-build utility"))
        .map(str::to_string)
        .collect()
}

/// True when cov-build reports nothing it could capture.
pub fn captured_nothing(summary: &[String]) -> bool {
    summary.iter().any(|l| {
        l.contains("compilation units")
            && l.split_whitespace().next().is_some_and(|n| n == "0")
    })
}

impl BuildAnalyzer for CoverityAnalyzer {
    fn doctor(&self) -> Result<ToolDiag> {
        let cov_build_version = self.version_of(&self.cov_build);
        let tar_version = self.version_of(&self.tar);
        let error = match (&cov_build_version, &tar_version) {
            (None, _) => Some(format!("{} not runnable", self.cov_build.display())),
            (_, None) => Some(format!("{} not runnable", self.tar.display())),
            _ => None,
        };
        Ok(ToolDiag {
            ok: error.is_none(),
            cov_build_version,
            tar_version,
            error,
        })
    }

    fn run(&self, req: &AnalysisRequest) -> Result<AnalysisResult> {
        ensure_dir(&req.work_dir)?;
        let int_dir = req.work_dir.join(&req.intermediate_dir);
        let mut warnings = Vec::new();

        if let Some(configure) = &req.plan.configure {
            let (program, args) = configure
                .split_first()
                .ok_or_else(|| anyhow!("empty configure command"))?;
            info!("configure {:?}: {}", req.plan.system, configure.join(" "));
            let out = self.run_tool(Path::new(program), args, &req.project_dir)?;
            if !out.status.success() {
                return Err(failure(Path::new(program), &out).context("configure step failed"));
            }
        }

        let mut cov_args = vec!["--dir".to_string(), int_dir.display().to_string()];
        cov_args.extend(req.plan.build.iter().cloned());
        info!("cov-build {}", req.plan.build.join(" "));
        let out = self.run_tool(&self.cov_build, &cov_args, &req.project_dir)?;
        let summary = summary_lines(&String::from_utf8_lossy(&out.stdout));
        for line in &summary {
            info!("cov-build: {line}");
        }
        if !out.status.success() {
            warn!("cov-build exited with {}", out.status);
            warnings.push(format!("cov-build exited with {}", out.status));
            return Ok(AnalysisResult {
                ok: false,
                archive: None,
                summary,
                warnings,
            });
        }
        if captured_nothing(&summary) {
            warnings.push("cov-build captured no compilation units".to_string());
            return Ok(AnalysisResult {
                ok: false,
                archive: None,
                summary,
                warnings,
            });
        }

        let tar_args = vec![
            "czf".to_string(),
            req.archive_path.display().to_string(),
            "-C".to_string(),
            req.work_dir.display().to_string(),
            req.intermediate_dir.clone(),
        ];
        let out = self.run_tool(&self.tar, &tar_args, &req.project_dir)?;
        if !out.status.success() {
            return Err(failure(&self.tar, &out).context("packing analysis archive"));
        }

        if !self.cfg.scan.keep_intermediates {
            if let Err(e) = std::fs::remove_dir_all(&int_dir) {
                warn!("could not remove {}: {e}", int_dir.display());
            }
        }

        Ok(AnalysisResult {
            ok: true,
            archive: Some(req.archive_path.clone()),
            summary,
            warnings,
        })
    }
}

/// Kills the tool and everything it forked.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;
        if let Err(e) = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
            debug!("killpg {}: {e}", child.id());
        }
    }
    let _ = child.kill();
}

fn spawn_reader<R: Read + Send + 'static>(
    reader: Option<R>,
    name: &'static str,
) -> Receiver<Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let res = match reader {
            Some(mut r) => r
                .read_to_end(&mut buf)
                .map(|_| buf)
                .with_context(|| format!("read {name}")),
            None => Ok(buf),
        };
        let _ = tx.send(res);
    });
    rx
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    // Drain pipes while waiting so a chatty build can't block on a full pipe buffer.
    let stdout_rx = spawn_reader(child.stdout.take(), "stdout");
    let stderr_rx = spawn_reader(child.stderr.take(), "stderr");

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            let stdout = stdout_rx
                .recv()
                .map_err(|_| anyhow!("stdout reader thread died"))??;
            let stderr = stderr_rx
                .recv()
                .map_err(|_| anyhow!("stderr reader thread died"))??;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("tool process timed out after {:?}", timeout);
            kill_tree(child);
            child.wait().with_context(|| "wait after kill")?;
            // A grandchild that left the group may still hold the pipe; don't wait on it.
            let stderr = stderr_rx
                .recv_timeout(Duration::from_millis(500))
                .ok()
                .and_then(|r| r.ok())
                .unwrap_or_default();
            return Err(anyhow!(
                "tool process exceeded timeout ({:?}); stderr: {}",
                timeout,
                String::from_utf8_lossy(&stderr)
            ));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COV_OUT: &str = "\
Coverity Build Capture (64-bit) version 2023.6.2
[INFO] Building...
Emitted 42 C/C++ compilation units (100%) successfully

42 C/C++ compilation units (100%) are ready for analysis
The cov-build utility completed successfully.
";

    #[test]
    fn summary_keeps_closing_report() {
        let s = summary_lines(COV_OUT);
        assert_eq!(s.len(), 3);
        assert!(s[1].starts_with("42 C/C++"));
        assert!(!captured_nothing(&s));
    }

    #[test]
    fn zero_units_is_nothing_captured() {
        let s = summary_lines("0 C/C++ compilation units (0%) are ready for analysis\n");
        assert!(captured_nothing(&s));
    }
}
