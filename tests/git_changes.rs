use cov_check::{changes::changed_files, config::Config};
use std::path::Path;
use std::process::Command;

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args([
            "-c",
            "user.name=cov-check",
            "-c",
            "user.email=ci@example.org",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?}");
}

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

/// Two commits: README first, then a source file plus a README edit.
fn repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    git(p, &["init", "-q"]);
    std::fs::write(p.join("README.md"), "one\n").unwrap();
    git(p, &["add", "."]);
    git(p, &["commit", "-q", "-m", "first"]);

    std::fs::create_dir_all(p.join("src")).unwrap();
    std::fs::write(p.join("src/a.cpp"), "int main() {}\n").unwrap();
    std::fs::write(p.join("README.md"), "two\n").unwrap();
    git(p, &["add", "."]);
    git(p, &["commit", "-q", "-m", "second"]);
    dir
}

#[test]
fn lists_files_of_the_range() {
    if !git_available() {
        return;
    }
    let dir = repo();
    let files = changed_files(&Config::default(), dir.path(), "HEAD~1", "HEAD").unwrap();
    assert_eq!(files, vec!["README.md", "src/a.cpp"]);
}

#[test]
fn empty_range_has_no_files() {
    if !git_available() {
        return;
    }
    let dir = repo();
    let files = changed_files(&Config::default(), dir.path(), "HEAD", "HEAD").unwrap();
    assert!(files.is_empty());
}

#[test]
fn unknown_base_is_an_error() {
    if !git_available() {
        return;
    }
    let dir = repo();
    let err = changed_files(&Config::default(), dir.path(), "no-such-rev", "HEAD").unwrap_err();
    assert!(err.to_string().contains("no-such-rev"));
}

#[test]
fn missing_git_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.scan.git_exe = dir.path().join("no-git").display().to_string();
    assert!(changed_files(&cfg, dir.path(), "HEAD~1", "HEAD").is_err());
}
