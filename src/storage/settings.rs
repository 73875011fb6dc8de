use anyhow::Result;
use async_trait::async_trait;

use super::{LocalStorage, SettingsStore};
use crate::entities::setting;
use crate::repositories::SettingRepository;

impl LocalStorage {
    /// Get all stored settings ordered by key
    pub async fn get_all_settings(&self) -> Result<Vec<setting::Model>> {
        SettingRepository::get_all(&self.conn).await
    }
}

#[async_trait]
impl SettingsStore for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(SettingRepository::get(&self.conn, key).await?.map(|s| s.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        SettingRepository::upsert(&self.conn, key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        SettingRepository::delete(&self.conn, key).await?;
        Ok(())
    }
}
