use cov_check::{
    config::Config,
    quota::{evaluate, limit_hours, AgoUnit},
};

fn full(text: &str) -> bool {
    evaluate(text, 12).quota_full
}

#[test]
fn days_are_normalised_to_hours() {
    assert!(!full("3 days ago"));
    assert!(!full("1 day ago"));
    assert_eq!(evaluate("3 days ago", 12).last_build_ago, Some((3, AgoUnit::Day)));
}

#[test]
fn hours_against_the_limit() {
    assert!(full("5 hours ago"));
    assert!(full("12 hours ago"));
    assert!(!full("13 hours ago"));
    assert!(!full("23 hours ago"));
    assert!(!full("about 20 hours ago"));
}

#[test]
fn fails_closed() {
    assert!(full("0 days ago"));
    assert!(full("0 hours ago"));
    assert!(full("10 minutes ago"));
    assert!(full(""));
    assert!(full("a day ago"));
}

#[test]
fn hour_check_runs_after_a_day_match() {
    // The hour clause re-decides after a passing day clause.
    let s = evaluate("1 day, 2 hours ago", 12);
    assert!(s.quota_full);
    assert_eq!(s.last_build_ago, Some((2, AgoUnit::Hour)));
}

#[test]
fn fixed_limit_without_scaling() {
    let cfg = Config::default();
    assert_eq!(limit_hours(&cfg, Some(5_000_000)), 12);
    assert_eq!(limit_hours(&cfg, None), 12);
}

#[test]
fn limit_scales_with_project_size() {
    let mut cfg = Config::default();
    cfg.quota.scale_by_lines_of_code = true;
    assert_eq!(limit_hours(&cfg, Some(50_000)), 6);
    assert_eq!(limit_hours(&cfg, Some(100_000)), 8);
    assert_eq!(limit_hours(&cfg, Some(750_000)), 12);
    assert_eq!(limit_hours(&cfg, Some(1_000_000)), 24);
    assert_eq!(limit_hours(&cfg, None), 12);

    assert!(evaluate("20 hours ago", limit_hours(&cfg, Some(2_000_000))).quota_full);
    assert!(!evaluate("7 hours ago", limit_hours(&cfg, Some(10_000))).quota_full);
}
