// src/models/configuration.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Listas de valores usadas pelo formulário de visita
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "config_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    VisitPurposes,
    CannaProducts,
    ShopPresentationOptions,
    CompetitorPresence,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Configuration {
    pub id: Uuid,
    pub config_type: ConfigType,
    #[schema(example = "Routine check")]
    pub config_name: String,
    #[schema(example = "routine_check")]
    pub config_value: String,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfigurationQuery {
    #[serde(rename = "type")]
    pub config_type: Option<ConfigType>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateConfigurationPayload {
    pub config_type: ConfigType,
    #[validate(length(min = 1, message = "required"))]
    pub config_name: String,
    #[validate(length(min = 1, message = "required"))]
    pub config_value: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateConfigurationPayload {
    pub config_type: Option<ConfigType>,
    #[validate(length(min = 1, message = "required"))]
    pub config_name: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub config_value: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}
