use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::site_setting::SiteSetting,
    ports::settings_cache::SettingsMap,
    use_cases::settings::SiteSettingRepo,
};

#[async_trait]
impl SiteSettingRepo for PostgresPersistence {
    async fn all(&self) -> AppResult<Vec<SiteSetting>> {
        sqlx::query_as::<_, SiteSetting>(
            "SELECT key, value, updated_at FROM site_settings ORDER BY key",
        )
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)
    }

    async fn upsert_many(&self, settings: &SettingsMap) -> AppResult<()> {
        let mut tx = self.pool().begin().await.map_err(AppError::from)?;
        for (key, value) in settings {
            sqlx::query(
                r#"
                INSERT INTO site_settings (key, value, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, updated_at = NOW()
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;
        }
        tx.commit().await.map_err(AppError::from)?;
        Ok(())
    }
}
