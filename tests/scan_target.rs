use cov_check::{
    build_plan::{BuildPlan, BuildSystem},
    changes::{in_scope, select_scan_target},
    config::Config,
};

fn files(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn first_in_scope_source_wins() {
    let cfg = Config::default();
    let changed = files(&["obsolete/x.c", "external/y.cpp", "src/z.cpp", "src/w.c", "README.md"]);
    assert_eq!(select_scan_target(&cfg.scan, &changed), Some("src/z.cpp"));
}

#[test]
fn nothing_in_scope() {
    let cfg = Config::default();
    let changed = files(&["docs/a.md", "include/a.h", "obsolete/old.cc"]);
    assert_eq!(select_scan_target(&cfg.scan, &changed), None);
    assert_eq!(select_scan_target(&cfg.scan, &[]), None);
}

#[test]
fn all_source_suffixes() {
    let cfg = Config::default();
    for f in ["a.c", "b/a.cc", "a.cpp", "lib/a.c++"] {
        assert!(in_scope(&cfg.scan, f), "{f}");
    }
    for f in ["a.h", "a.hpp", "a.cxx", "a.c.orig"] {
        assert!(!in_scope(&cfg.scan, f), "{f}");
    }
}

#[test]
fn detects_build_systems() {
    let cfg = Config::default();
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(BuildPlan::detect(&cfg, dir.path(), &dir.path().join("work/build")), None);

    std::fs::write(dir.path().join("Makefile"), "all:\n").unwrap();
    let plan = BuildPlan::detect(&cfg, dir.path(), &dir.path().join("work/build")).unwrap();
    assert_eq!(plan.system, BuildSystem::Make);
    assert_eq!(plan.configure, None);

    std::fs::write(dir.path().join("CMakeLists.txt"), "").unwrap();
    assert_eq!(BuildPlan::detect(&cfg, dir.path(), &dir.path().join("work/build")).unwrap().system, BuildSystem::CMake);

    std::fs::write(dir.path().join("meson.build"), "").unwrap();
    let plan = BuildPlan::detect(&cfg, dir.path(), &dir.path().join("work/build")).unwrap();
    assert_eq!(plan.system, BuildSystem::Meson);
    assert!(plan.configure.is_some());
}

#[test]
fn configured_command_overrides_detection() {
    let mut cfg = Config::default();
    cfg.scan.build_command = vec!["./build.sh".into(), "--all".into()];
    let dir = tempfile::tempdir().unwrap();
    let plan = BuildPlan::detect(&cfg, dir.path(), &dir.path().join("work/build")).unwrap();
    assert_eq!(plan.system, BuildSystem::Custom);
    assert_eq!(plan.build, vec!["./build.sh", "--all"]);
}

#[test]
fn configure_builds_out_of_tree() {
    let cfg = Config::default();
    let project = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let build_dir = work.path().join("build");
    let out = build_dir.display().to_string();

    std::fs::write(project.path().join("CMakeLists.txt"), "").unwrap();
    let plan = BuildPlan::detect(&cfg, project.path(), &build_dir).unwrap();
    assert_eq!(
        plan.configure.unwrap(),
        vec!["cmake", "-S", ".", "-B", out.as_str()]
    );
    assert_eq!(plan.build, vec!["cmake", "--build", out.as_str()]);

    std::fs::write(project.path().join("meson.build"), "").unwrap();
    let plan = BuildPlan::detect(&cfg, project.path(), &build_dir).unwrap();
    assert_eq!(plan.configure.unwrap(), vec!["meson", "setup", out.as_str()]);
    assert_eq!(plan.build, vec!["ninja", "-C", out.as_str()]);
    assert_eq!(std::fs::read_dir(project.path()).unwrap().count(), 2);
}

#[test]
fn meson_rerun_reconfigures() {
    let cfg = Config::default();
    let project = tempfile::tempdir().unwrap();
    let build_dir = project.path().join(".cov-check-work/build");
    std::fs::write(project.path().join("meson.build"), "").unwrap();
    std::fs::create_dir_all(build_dir.join("meson-private")).unwrap();

    let plan = BuildPlan::detect(&cfg, project.path(), &build_dir).unwrap();
    let out = build_dir.display().to_string();
    assert_eq!(
        plan.configure.unwrap(),
        vec!["meson", "setup", "--reconfigure", out.as_str()]
    );
}
