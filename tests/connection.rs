use fittrack::backend::MemoryBackend;
use fittrack::config::Config;
use fittrack::connection::{ConnectionManager, Credentials, EnvDefaults};
use fittrack::constants::{PLACEHOLDER_URL, SETTING_SUPABASE_KEY, SETTING_SUPABASE_URL};
use fittrack::storage::{MemorySettings, SettingsStore};
use std::sync::Arc;

fn env(url: Option<&str>, key: Option<&str>) -> EnvDefaults {
    EnvDefaults {
        supabase_url: url.map(str::to_string),
        supabase_key: key.map(str::to_string),
        gemini_api_key: None,
    }
}

async fn build(stored: &[(&str, &str)], env: EnvDefaults) -> (ConnectionManager, Arc<MemorySettings>) {
    let settings = Arc::new(MemorySettings::with_values(stored.iter().copied()));
    let store: Arc<dyn SettingsStore> = settings.clone();
    (ConnectionManager::new(store, env).await.unwrap(), settings)
}

#[tokio::test]
async fn test_stored_settings_override_env() {
    let (manager, _) = build(
        &[
            (SETTING_SUPABASE_URL, "https://stored.supabase.co"),
            (SETTING_SUPABASE_KEY, "stored-key"),
        ],
        env(Some("https://env.supabase.co"), Some("env-key")),
    )
    .await;

    assert_eq!(
        manager.resolve_credentials().await.unwrap(),
        Some(Credentials::new("https://stored.supabase.co", "stored-key"))
    );
    assert!(manager.is_configured().await.unwrap());
    assert_eq!(manager.current().await.endpoint(), "https://stored.supabase.co");
}

#[tokio::test]
async fn test_env_defaults_used_without_stored_settings() {
    let (manager, _) = build(&[], env(Some("https://env.supabase.co"), Some("env-key"))).await;

    assert_eq!(
        manager.resolve_credentials().await.unwrap(),
        Some(Credentials::new("https://env.supabase.co", "env-key"))
    );
    assert!(manager.is_configured().await.unwrap());
}

#[tokio::test]
async fn test_nothing_configured() {
    let (manager, _) = build(&[], EnvDefaults::default()).await;

    assert_eq!(manager.resolve_credentials().await.unwrap(), None);
    assert!(!manager.is_configured().await.unwrap());
    assert_eq!(manager.current().await.endpoint(), PLACEHOLDER_URL);
}

#[tokio::test]
async fn test_precedence_is_per_field() {
    let (manager, _) = build(
        &[(SETTING_SUPABASE_URL, "https://stored.supabase.co")],
        env(Some("https://env.supabase.co"), Some("env-key")),
    )
    .await;

    assert_eq!(
        manager.resolve_credentials().await.unwrap(),
        Some(Credentials::new("https://stored.supabase.co", "env-key"))
    );
}

#[tokio::test]
async fn test_placeholders_are_not_configured() {
    let (manager, _) = build(&[], env(Some("https://placeholder.supabase.co"), Some("real-key"))).await;
    assert!(!manager.is_configured().await.unwrap());

    let (manager, _) = build(&[], env(Some("https://real.supabase.co"), Some("placeholder"))).await;
    assert!(!manager.is_configured().await.unwrap());
}

#[tokio::test]
async fn test_save_config_persists_and_rebinds() {
    let (manager, settings) = build(&[], EnvDefaults::default()).await;

    manager.save_config("https://new.supabase.co/", "new-key").await.unwrap();

    assert_eq!(
        settings.get(SETTING_SUPABASE_URL).await.unwrap().as_deref(),
        Some("https://new.supabase.co/")
    );
    assert_eq!(settings.get(SETTING_SUPABASE_KEY).await.unwrap().as_deref(), Some("new-key"));
    assert!(manager.is_configured().await.unwrap());
    assert_eq!(manager.current().await.endpoint(), "https://new.supabase.co");
    assert_eq!(manager.data_service().await.backend().endpoint(), "https://new.supabase.co");
}

#[tokio::test]
async fn test_save_config_failure_keeps_old_state() {
    let (manager, settings) = build(
        &[
            (SETTING_SUPABASE_URL, "https://old.supabase.co"),
            (SETTING_SUPABASE_KEY, "old-key"),
        ],
        EnvDefaults::default(),
    )
    .await;

    assert!(manager.save_config("not a url", "new-key").await.is_err());
    assert!(manager.save_config("https://new.supabase.co", "  ").await.is_err());

    assert_eq!(
        settings.get(SETTING_SUPABASE_URL).await.unwrap().as_deref(),
        Some("https://old.supabase.co")
    );
    assert_eq!(settings.get(SETTING_SUPABASE_KEY).await.unwrap().as_deref(), Some("old-key"));
    assert_eq!(manager.current().await.endpoint(), "https://old.supabase.co");
}

#[tokio::test]
async fn test_clear_config_falls_back_to_env() {
    let (manager, settings) = build(
        &[
            (SETTING_SUPABASE_URL, "https://stored.supabase.co"),
            (SETTING_SUPABASE_KEY, "stored-key"),
        ],
        env(Some("https://env.supabase.co"), Some("env-key")),
    )
    .await;

    manager.clear_config().await.unwrap();

    assert_eq!(settings.get(SETTING_SUPABASE_URL).await.unwrap(), None);
    assert_eq!(settings.get(SETTING_SUPABASE_KEY).await.unwrap(), None);
    assert_eq!(manager.current().await.endpoint(), "https://env.supabase.co");
}

#[tokio::test]
async fn test_clear_config_without_env_uses_placeholder() {
    let (manager, _) = build(
        &[
            (SETTING_SUPABASE_URL, "https://stored.supabase.co"),
            (SETTING_SUPABASE_KEY, "stored-key"),
        ],
        EnvDefaults::default(),
    )
    .await;

    manager.clear_config().await.unwrap();
    assert_eq!(manager.current().await.endpoint(), PLACEHOLDER_URL);
    assert!(!manager.is_configured().await.unwrap());
}

#[tokio::test]
async fn test_non_http_endpoint_is_not_configured() {
    let (manager, _) = build(&[], env(Some("memory://local"), Some("any"))).await;

    assert!(!manager.is_configured().await.unwrap());
    assert_eq!(manager.current().await.backend_type(), "supabase");
    assert_eq!(manager.current().await.endpoint(), PLACEHOLDER_URL);
}

#[tokio::test]
async fn test_save_config_rejects_non_http_endpoint() {
    let (manager, settings) = build(&[], env(Some("https://env.supabase.co"), Some("env-key"))).await;

    assert!(manager.save_config("memory://local", "any").await.is_err());

    assert_eq!(settings.get(SETTING_SUPABASE_URL).await.unwrap(), None);
    assert_eq!(manager.current().await.endpoint(), "https://env.supabase.co");
}

#[tokio::test]
async fn test_injected_backend_keeps_state_across_services() {
    let store: Arc<dyn SettingsStore> = Arc::new(MemorySettings::new());
    let manager = ConnectionManager::with_backend(store, EnvDefaults::default(), Arc::new(MemoryBackend::new()));

    let user = manager
        .data_service()
        .await
        .register("ada@example.com", "Ada", "ada", "secret123")
        .await
        .unwrap();

    let restored = manager.data_service().await.restore_session().await.unwrap();
    assert_eq!(restored.map(|u| u.id), Some(user.id));
    assert_eq!(manager.current().await.backend_type(), "memory");
}

#[test]
fn test_env_defaults_read_configured_names() {
    let mut config = Config::default();
    config.backend.url_env = "FITTRACK_TEST_URL_UNSET_9F2".to_string();
    config.backend.key_env = "FITTRACK_TEST_KEY_UNSET_9F2".to_string();
    config.coach.api_key_env = "FITTRACK_TEST_GEMINI_UNSET_9F2".to_string();

    assert_eq!(EnvDefaults::from_config(&config), EnvDefaults::default());
}
