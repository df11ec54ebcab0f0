use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::services::checklist::ChecklistResult;

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Please fill in all required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    #[error("Pre-submission checklist is incomplete")]
    ChecklistIncomplete(ChecklistResult),

    #[error("Invalid visit data: {0}")]
    InvalidVisitData(#[from] serde_json::Error),

    #[error("A customer must be selected before the visit can be saved")]
    CustomerRequired,

    #[error("Visit not found")]
    VisitNotFound,

    #[error("Visit report has already been submitted and can no longer be changed")]
    VisitFinalized,

    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Cannot delete customer with associated visit reports")]
    CustomerHasVisits,

    #[error("Configuration not found")]
    ConfigurationNotFound,

    #[error("Email already in use")]
    EmailAlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Access token required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    // Variante para erros de banco de dados
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingRequiredFields(_)
            | AppError::InvalidVisitData(_)
            | AppError::CustomerRequired => StatusCode::BAD_REQUEST,
            AppError::ChecklistIncomplete(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::VisitNotFound
            | AppError::CustomerNotFound
            | AppError::ConfigurationNotFound
            | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::VisitFinalized
            | AppError::CustomerHasVisits
            | AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::MissingToken | AppError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            // Retorna todos os detalhes da validação
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "One or more fields are invalid.",
                    "details": details,
                })
            }
            AppError::MissingRequiredFields(fields) => json!({
                "error": self.to_string(),
                "details": { "missing_fields": fields },
            }),
            AppError::ChecklistIncomplete(checklist) => json!({
                "error": self.to_string(),
                "details": checklist,
            }),

            // Erros 5xx: o detalhe vai só para o log
            e if status.is_server_error() => {
                tracing::error!("Internal server error: {}", e);
                json!({ "error": "An unexpected error occurred." })
            }

            e => json!({ "error": e.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Erros do ciclo de vida do relatório de visita (lado do formulário).
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Please fill in all required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Pre-submission checklist is incomplete")]
    ChecklistIncomplete(ChecklistResult),

    #[error("Visit report has already been submitted")]
    Finalized,

    #[error("Visit report has not been saved as a draft yet")]
    NotPersisted,

    #[error("Customer {0} not found")]
    CustomerNotFound(Uuid),

    #[error("{context}")]
    Persistence {
        context: &'static str,
        #[source]
        source: AppError,
    },
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(fields) => AppError::MissingRequiredFields(fields),
            LifecycleError::ChecklistIncomplete(checklist) => AppError::ChecklistIncomplete(checklist),
            LifecycleError::Finalized => AppError::VisitFinalized,
            LifecycleError::NotPersisted => AppError::VisitNotFound,
            LifecycleError::CustomerNotFound(_) => AppError::CustomerNotFound,
            LifecycleError::Persistence { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_expected_status() {
        assert_eq!(
            AppError::MissingRequiredFields(vec!["shop_name".into()]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::VisitFinalized.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::CustomerHasVisits.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::VisitNotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn malformed_visit_fields_are_a_bad_request() {
        let parse_err = serde_json::from_str::<i32>("\"ten\"").unwrap_err();
        let err = AppError::from(parse_err);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("Invalid visit data"));
    }

    #[test]
    fn database_errors_become_500() {
        let response = AppError::DatabaseError(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_fields_message_lists_names() {
        let err = AppError::MissingRequiredFields(vec!["shop_type".into(), "visit_date".into()]);
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields: shop_type, visit_date"
        );
    }

    #[test]
    fn lifecycle_errors_convert_to_http_errors() {
        let checklist = ChecklistResult {
            photos_attached: false,
            questionnaire_complete: true,
            follow_up_added: true,
            signature_attached: true,
            all_pass: false,
        };
        let err: AppError = LifecycleError::ChecklistIncomplete(checklist).into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: AppError = LifecycleError::Persistence {
            context: "failed to submit the visit report",
            source: AppError::VisitNotFound,
        }
        .into();
        assert!(matches!(err, AppError::VisitNotFound));
    }
}
