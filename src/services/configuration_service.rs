// src/services/configuration_service.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ConfigurationRepository,
    models::configuration::{
        ConfigType, Configuration, CreateConfigurationPayload, UpdateConfigurationPayload,
    },
};

#[derive(Clone)]
pub struct ConfigurationService {
    repo: ConfigurationRepository,
}

impl ConfigurationService {
    pub fn new(repo: ConfigurationRepository) -> Self {
        Self { repo }
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        config_type: Option<ConfigType>,
    ) -> Result<Vec<Configuration>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_active(executor, config_type).await
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &CreateConfigurationPayload,
    ) -> Result<Configuration, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create(executor, payload).await
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateConfigurationPayload,
    ) -> Result<Configuration, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update(executor, id, payload)
            .await?
            .ok_or(AppError::ConfigurationNotFound)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        match self.repo.delete(executor, id).await? {
            0 => Err(AppError::ConfigurationNotFound),
            _ => Ok(()),
        }
    }
}
