// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::customer::RecordStatus;

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Manager,
    Admin,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub status: RecordStatus,

    pub department: Option<String>,
    pub territory: Option<String>,
    pub phone: Option<String>,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub password_reset_required: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "Invalid email"))]
    #[schema(example = "rep@canna.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

// PUT /api/users/profile
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 2, message = "Full name must have at least 2 characters"))]
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub territory: Option<String>,
    pub phone: Option<String>,
}

// PUT /api/users/{id} (admin)
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct AdminUpdateUserPayload {
    pub role: Option<UserRole>,
    pub status: Option<RecordStatus>,
    pub department: Option<String>,
    pub territory: Option<String>,
    pub phone: Option<String>,
}

// POST /api/users/{id}/reset-password (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordPayload {
    #[validate(length(min = 8, message = "Password must have at least 8 characters"))]
    pub password: String,
    #[serde(default = "default_require_change")]
    pub require_change_on_login: bool,
}

fn default_require_change() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_password_requires_change_by_default() {
        let payload: ResetPasswordPayload =
            serde_json::from_value(serde_json::json!({ "password": "short" })).unwrap();

        assert!(payload.require_change_on_login);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = serde_json::from_value::<AdminUpdateUserPayload>(
            serde_json::json!({ "role": "superuser" }),
        );
        assert!(result.is_err());
    }
}
