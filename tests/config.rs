// tests/config.rs
use energy_news_aggregator::config::{AppConfig, ENV_CONFIG_PATH};
use energy_news_aggregator::filter::EnergyRule;
use std::path::PathBuf;
use std::{env, fs};

const OVERRIDES: [&str; 4] = [
    "NEWS_FEED_LIST",
    "NEWS_CHART_PATH",
    "NEWS_ENERGY_RULE",
    "NEWS_METRICS",
];

fn clear_env() {
    env::remove_var(ENV_CONFIG_PATH);
    for k in OVERRIDES {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn defaults_then_file_then_env_path() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) Nothing on disk → defaults
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg, AppConfig::default());

    // 2) ./config/app.toml fallback
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/app.toml"),
        "feed_list_path = \"feeds.toml\"\nhttp_timeout_secs = 3\n",
    )
    .unwrap();
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.feed_list_path, PathBuf::from("feeds.toml"));
    assert_eq!(cfg.http_timeout_secs, 3);

    // 3) Env path wins over the fallback
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "energy_rule = \"always_present\"\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.energy_rule, EnergyRule::AlwaysPresent);
    assert_eq!(cfg.feed_list_path, PathBuf::from("feed_links.csv"));

    // 4) Env path pointing nowhere is an error, not a silent default
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
    assert!(AppConfig::load().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_apply_on_top() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    env::set_var("NEWS_FEED_LIST", "lists/feeds.json");
    env::set_var("NEWS_CHART_PATH", "static/charts/topics.svg");
    env::set_var("NEWS_ENERGY_RULE", "legacy");
    env::set_var("NEWS_METRICS", "off");
    let cfg = AppConfig::load().unwrap();
    assert_eq!(cfg.feed_list_path, PathBuf::from("lists/feeds.json"));
    assert_eq!(cfg.chart_path, PathBuf::from("static/charts/topics.svg"));
    assert_eq!(cfg.chart_url().as_deref(), Some("/static/charts/topics.svg"));
    assert_eq!(cfg.energy_rule, EnergyRule::AlwaysPresent);
    assert!(!cfg.metrics_enabled);

    env::set_var("NEWS_ENERGY_RULE", "fuzzy");
    assert!(AppConfig::load().is_err());
    env::set_var("NEWS_ENERGY_RULE", "literal");
    env::set_var("NEWS_METRICS", "maybe");
    assert!(AppConfig::load().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}
