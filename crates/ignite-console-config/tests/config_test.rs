#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use ignite_console_config::{
    Config, Defaults, Profile, load_config_from, profile_to_console_config, save_config_to,
};

fn sample() -> Config {
    let mut cfg = Config {
        default_profile: Some("staging".into()),
        defaults: Defaults {
            output: "yaml".into(),
            insecure: false,
            timeout: 45,
        },
        ..Config::default()
    };
    cfg.profiles.insert(
        "staging".into(),
        Profile {
            email: Some("ops@example.com".into()),
            password: Some("hunter2".into()),
            insecure: Some(true),
            ..Profile::new("https://staging.console.example.com")
        },
    );
    cfg.profiles
        .insert("local".into(), Profile::new("http://localhost:3000"));
    cfg
}

#[test]
fn profile_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let cfg = sample();
    save_config_to(&cfg, &path).unwrap();
    let loaded = load_config_from(&path).unwrap();

    assert_eq!(loaded, cfg);
    assert_eq!(loaded.profile_names(), vec!["local", "staging"]);
}

#[test]
fn saved_file_is_plain_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    save_config_to(&sample(), &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("default_profile = \"staging\""));
    assert!(text.contains("[profiles.local]"));
    assert!(text.contains("url = \"http://localhost:3000\""));
}

#[test]
fn loaded_profile_builds_console_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    save_config_to(&sample(), &path).unwrap();
    let cfg = load_config_from(&path).unwrap();

    let console = profile_to_console_config(&cfg.profiles["local"], "local", &cfg.defaults).unwrap();
    assert_eq!(console.url.as_str(), "http://localhost:3000/");
    assert_eq!(console.timeout.as_secs(), 45);
}
