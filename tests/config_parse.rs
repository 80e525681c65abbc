use cov_check::config::{Config, ENV_RED_CARD, ENV_YELLOW_CARD};
use std::collections::HashMap;

fn example() -> Config {
    let raw = include_str!("../cov-check.example.toml");
    toml::from_str(raw).expect("parse TOML")
}

#[test]
fn parse_example_config() {
    let cfg = example();
    cfg.validate().expect("example config is valid");
    assert_eq!(cfg.quota.limit_hours, 12);
    assert!(cfg.thresholds.yellow_card <= cfg.thresholds.red_card);
    assert_eq!(
        cfg.service.report_url(),
        "https://scan.coverity.com/projects/example-org-example-project"
    );
    assert_eq!(
        cfg.service.upload_url(),
        "https://scan.coverity.com/builds?project=example-org%2Fexample-project"
    );
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[service]\naccount = \"a\"\nrepo = \"b\"\nbase_url = \"https://x/\"\nreport_url_pattern = \"{base_url}/p/{repo}\"\nupload_url_pattern = \"\"\ntoken_env = \"T\"\nemail_env = \"E\"\nhttp_timeout_seconds = 5\n").unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.service.report_url(), "https://x/p/b");
    assert_eq!(cfg.scan.excluded_prefixes, vec!["obsolete/", "external/"]);
}

#[test]
fn rejects_yellow_above_red() {
    let mut cfg = example();
    cfg.thresholds.yellow_card = 30;
    cfg.thresholds.red_card = 20;
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("yellow_card"));
}

#[test]
fn environment_overlays_credentials_and_cards() {
    let env: HashMap<&str, &str> = [
        ("COVERITY_TOKEN", "cov-secret"),
        ("GITHUB_TOKEN", "gh-secret"),
        (ENV_YELLOW_CARD, "3"),
        (ENV_RED_CARD, " 7 "),
    ]
    .into_iter()
    .collect();

    let mut cfg = example();
    cfg.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(cfg.service.token, "cov-secret");
    assert_eq!(cfg.forge.token, "gh-secret");
    assert_eq!(cfg.thresholds.yellow_card, 3);
    assert_eq!(cfg.thresholds.red_card, 7);

    let dumped = toml::to_string(&cfg.redacted()).unwrap();
    assert!(!dumped.contains("secret"));
}

#[test]
fn bad_threshold_env_is_an_error() {
    let mut cfg = example();
    let res = cfg.apply_env(|k| (k == ENV_RED_CARD).then(|| "lots".to_string()));
    assert!(res.is_err());
}
