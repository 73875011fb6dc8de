use fittrack::constants::{SETTING_SUPABASE_KEY, SETTING_SUPABASE_URL};
use fittrack::storage::{LocalStorage, MemorySettings, SettingsStore};

#[tokio::test]
async fn test_local_storage_creation() {
    let result = LocalStorage::in_memory().await;
    assert!(result.is_ok(), "LocalStorage should be created successfully");
}

#[tokio::test]
async fn test_settings_round_trip_in_memory() {
    let storage = LocalStorage::in_memory().await.unwrap();

    assert_eq!(storage.get(SETTING_SUPABASE_URL).await.unwrap(), None);

    storage.set(SETTING_SUPABASE_URL, "https://a.supabase.co").await.unwrap();
    storage.set(SETTING_SUPABASE_KEY, "anon").await.unwrap();
    assert_eq!(
        storage.get(SETTING_SUPABASE_URL).await.unwrap().as_deref(),
        Some("https://a.supabase.co")
    );

    // Upsert replaces the value
    storage.set(SETTING_SUPABASE_URL, "https://b.supabase.co").await.unwrap();
    assert_eq!(
        storage.get(SETTING_SUPABASE_URL).await.unwrap().as_deref(),
        Some("https://b.supabase.co")
    );

    let all = storage.get_all_settings().await.unwrap();
    let keys: Vec<&str> = all.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec![SETTING_SUPABASE_KEY, SETTING_SUPABASE_URL]);

    storage.remove(SETTING_SUPABASE_URL).await.unwrap();
    assert_eq!(storage.get(SETTING_SUPABASE_URL).await.unwrap(), None);

    // Removing a missing key is fine
    storage.remove(SETTING_SUPABASE_URL).await.unwrap();
}

#[tokio::test]
async fn test_settings_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("fittrack.db");

    {
        let storage = LocalStorage::open(&path).await.unwrap();
        storage.set(SETTING_SUPABASE_KEY, "persisted").await.unwrap();
    }

    let reopened = LocalStorage::open(&path).await.unwrap();
    assert_eq!(
        reopened.get(SETTING_SUPABASE_KEY).await.unwrap().as_deref(),
        Some("persisted")
    );
}

#[tokio::test]
async fn test_memory_settings() {
    let settings = MemorySettings::with_values([(SETTING_SUPABASE_URL, "https://seed.supabase.co")]);
    assert_eq!(
        settings.get(SETTING_SUPABASE_URL).await.unwrap().as_deref(),
        Some("https://seed.supabase.co")
    );

    settings.set(SETTING_SUPABASE_KEY, "k").await.unwrap();
    settings.remove(SETTING_SUPABASE_URL).await.unwrap();
    assert_eq!(settings.get(SETTING_SUPABASE_URL).await.unwrap(), None);
    assert_eq!(settings.get(SETTING_SUPABASE_KEY).await.unwrap().as_deref(), Some("k"));
}
