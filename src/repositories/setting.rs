//! Setting repository for database operations.

use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ConnectionTrait, EntityTrait, QueryOrder};

use crate::entities::setting;

/// Repository for setting-related database operations.
pub struct SettingRepository;

impl SettingRepository {
    /// Get a setting by key.
    pub async fn get<C>(conn: &C, key: &str) -> Result<Option<setting::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(setting::Entity::find_by_id(key.to_string()).one(conn).await?)
    }

    /// Get all settings ordered by key.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<setting::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(setting::Entity::find()
            .order_by_asc(setting::Column::Key)
            .all(conn)
            .await?)
    }

    /// Insert a setting or overwrite the existing value for its key.
    pub async fn upsert<C>(conn: &C, key: &str, value: &str) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let model = setting::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
            updated_at: ActiveValue::Set(Utc::now().to_rfc3339()),
        };

        setting::Entity::insert(model)
            .on_conflict(
                OnConflict::column(setting::Column::Key)
                    .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(conn)
            .await?;

        Ok(())
    }

    /// Delete a setting by key. Returns whether a row was removed.
    pub async fn delete<C>(conn: &C, key: &str) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let result = setting::Entity::delete_by_id(key.to_string()).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }
}
