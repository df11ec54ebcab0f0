pub mod auth;
pub mod configuration;
pub mod customer;
pub mod visit;

use serde::Serialize;
use utoipa::ToSchema;

// Resposta simples para operações sem corpo (ex: DELETE)
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Visit deleted successfully")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
