// src/services/user_service.rs

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AdminUpdateUserPayload, ResetPasswordPayload, UpdateProfilePayload, User},
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, pool: PgPool) -> Self {
        Self { user_repo, pool }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list().await
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        payload: &UpdateProfilePayload,
    ) -> Result<User, AppError> {
        self.user_repo
            .update_profile(user_id, payload)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Alteração administrativa (papel, status, lotação). Fica registrada no audit log.
    pub async fn admin_update(
        &self,
        actor: &User,
        target_id: Uuid,
        payload: &AdminUpdateUserPayload,
    ) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = self
            .user_repo
            .admin_update(&mut *tx, target_id, payload)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let details = serde_json::to_value(payload)
            .map_err(|e| anyhow::anyhow!("Failed to serialize audit details: {}", e))?;

        self.user_repo
            .insert_audit_log(&mut *tx, actor, &updated, "user_updated", &details)
            .await?;

        tx.commit().await?;

        tracing::info!(actor = %actor.id, target = %updated.id, "User updated by administrator");
        Ok(updated)
    }

    pub async fn reset_password(
        &self,
        actor: &User,
        target_id: Uuid,
        payload: &ResetPasswordPayload,
    ) -> Result<User, AppError> {
        let hashed_password = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        let updated = self
            .user_repo
            .set_password(
                &mut *tx,
                target_id,
                &hashed_password,
                payload.require_change_on_login,
                &actor.email,
            )
            .await?
            .ok_or(AppError::UserNotFound)?;

        let details = json!({ "require_change_on_login": payload.require_change_on_login });
        self.user_repo
            .insert_audit_log(&mut *tx, actor, &updated, "password_reset", &details)
            .await?;

        tx.commit().await?;

        tracing::info!(actor = %actor.id, target = %updated.id, "Password reset by administrator");
        Ok(updated)
    }
}
