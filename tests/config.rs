use fittrack::config::Config;
use fittrack::constants::{COACH_HISTORY_WINDOW, DEFAULT_GEMINI_KEY_ENV, DEFAULT_KEY_ENV, DEFAULT_URL_ENV};
use fittrack::utils::datetime;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.backend.url_env, DEFAULT_URL_ENV);
    assert_eq!(config.backend.key_env, DEFAULT_KEY_ENV);
    assert_eq!(config.backend.avatar_bucket, "avatars");
    assert_eq!(config.coach.api_key_env, DEFAULT_GEMINI_KEY_ENV);
    assert_eq!(config.coach.model, "gemini-2.5-flash");
    assert_eq!(config.coach.history_window, COACH_HISTORY_WINDOW);
    assert!(config.storage.database_path.is_none());
    assert!(!config.logging.enabled);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.display.weight_unit, "lbs");
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    // History window out of range should fail
    config.coach.history_window = 0;
    assert!(config.validate().is_err());
    config.coach.history_window = 51;
    assert!(config.validate().is_err());

    // Reset and test empty env names
    config.coach.history_window = 5;
    config.backend.url_env = "  ".to_string();
    assert!(config.validate().is_err());

    config = Config::default();
    config.coach.model = String::new();
    assert!(config.validate().is_err());

    config = Config::default();
    config.logging.level = "chatty".to_string();
    assert!(config.validate().is_err());

    config = Config::default();
    config.display.date_format = "%Q".to_string();
    assert!(config.validate().is_err());

    config = Config::default();
    config.display.date_format = "%d %b %Y".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("url_env = \"SUPABASE_URL\""));
    assert!(toml_str.contains("history_window = 5"));
}

#[test]
fn test_partial_config_deserialization() {
    // Test that partial TOML configs merge with defaults
    let partial_toml = r#"
[coach]
model = "gemini-2.0-flash"

[logging]
enabled = true
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    // Check that specified values are used
    assert_eq!(config.coach.model, "gemini-2.0-flash");
    assert!(config.logging.enabled);

    // Check that unspecified values use defaults
    assert_eq!(config.coach.history_window, COACH_HISTORY_WINDOW);
    assert_eq!(config.coach.api_key_env, DEFAULT_GEMINI_KEY_ENV);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.display.date_format, datetime::DISPLAY_DATE_FORMAT);
    assert_eq!(config.backend.key_env, DEFAULT_KEY_ENV);
}

#[test]
fn test_empty_config_deserialization() {
    let config: Config = toml::from_str("").unwrap();
    let default_config = Config::default();

    assert_eq!(config.backend.url_env, default_config.backend.url_env);
    assert_eq!(config.coach.model, default_config.coach.model);
    assert_eq!(config.logging.enabled, default_config.logging.enabled);
    assert_eq!(config.display.date_format, default_config.display.date_format);
}

#[test]
fn test_load_from_file_validates() {
    let dir = tempfile::tempdir().unwrap();

    let good = dir.path().join("good.toml");
    std::fs::write(&good, "[storage]\ndatabase_path = \"/tmp/fittrack-test.db\"\n").unwrap();
    let config = Config::load_from_file(&good).unwrap();
    assert_eq!(
        config.storage.database_path.as_deref(),
        Some(std::path::Path::new("/tmp/fittrack-test.db"))
    );
    assert_eq!(config.database_path(), config.storage.database_path);

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[coach]\nhistory_window = 500\n").unwrap();
    assert!(Config::load_from_file(&bad).is_err());

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[coach\n").unwrap();
    assert!(Config::load_from_file(&broken).is_err());
}

#[test]
fn test_generate_default_config_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    Config::generate_default_config(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# FitTrack Configuration File"));
    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.coach.model, Config::default().coach.model);
}
