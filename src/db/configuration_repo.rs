// src/db/configuration_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::configuration::{
        ConfigType, Configuration, CreateConfigurationPayload, UpdateConfigurationPayload,
    },
};

#[derive(Clone, Default)]
pub struct ConfigurationRepository;

impl ConfigurationRepository {
    pub fn new() -> Self {
        Self
    }

    /// Entradas ativas, opcionalmente de um único tipo, na ordem de exibição.
    pub async fn list_active<'e, E>(
        &self,
        executor: E,
        config_type: Option<ConfigType>,
    ) -> Result<Vec<Configuration>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, Configuration>(
            r#"
            SELECT * FROM configurations
            WHERE is_active = TRUE
              AND ($1::config_type IS NULL OR config_type = $1)
            ORDER BY config_type, display_order, config_name
            "#,
        )
            .bind(config_type)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &CreateConfigurationPayload,
    ) -> Result<Configuration, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, Configuration>(
            r#"
            INSERT INTO configurations (config_type, config_name, config_value, display_order, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(payload.config_type)
            .bind(&payload.config_name)
            .bind(&payload.config_value)
            .bind(payload.display_order)
            .bind(payload.is_active)
            .fetch_one(executor)
            .await?;
        Ok(item)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateConfigurationPayload,
    ) -> Result<Option<Configuration>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, Configuration>(
            r#"
            UPDATE configurations SET
                config_type = COALESCE($2, config_type),
                config_name = COALESCE($3, config_name),
                config_value = COALESCE($4, config_value),
                display_order = COALESCE($5, display_order),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(payload.config_type)
            .bind(&payload.config_name)
            .bind(&payload.config_value)
            .bind(payload.display_order)
            .bind(payload.is_active)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM configurations WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
