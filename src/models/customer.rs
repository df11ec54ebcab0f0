// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

// Mapeia o CREATE TYPE shop_type do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "shop_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShopType {
    Growshop,
    GardenCenter,
    Nursery,
    HydroponicsStore,
    Other,
}

// Compartilhado entre clientes e usuários (CREATE TYPE record_status)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "record_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

// --- CLIENTE (A Loja) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: Uuid,

    #[schema(example = "Acme Grow")]
    pub shop_name: String,
    pub shop_type: ShopType,

    pub shop_address: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,

    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub job_title: Option<String>,

    pub region: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub gps_coordinates: Option<Value>,

    pub status: RecordStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerPayload {
    #[validate(length(min = 2, message = "Shop name must have at least 2 characters"))]
    #[schema(example = "Acme Grow")]
    pub shop_name: String,

    #[schema(example = "growshop")]
    pub shop_type: ShopType,

    pub shop_address: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,

    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,

    #[validate(email(message = "Invalid email"))]
    #[schema(example = "owner@acmegrow.com")]
    pub contact_email: Option<String>,
    pub job_title: Option<String>,
    pub region: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub gps_coordinates: Option<Value>,

    #[serde(default)]
    pub status: RecordStatus,
}

// Atualização parcial: campos ausentes mantêm o valor atual (COALESCE no SQL)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 2, message = "Shop name must have at least 2 characters"))]
    pub shop_name: Option<String>,
    pub shop_type: Option<ShopType>,

    pub shop_address: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,

    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,

    #[validate(email(message = "Invalid email"))]
    pub contact_email: Option<String>,
    pub job_title: Option<String>,
    pub region: Option<String>,

    #[schema(value_type = Option<Object>)]
    pub gps_coordinates: Option<Value>,

    pub status: Option<RecordStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_rejects_short_name_and_bad_email() {
        let payload: CreateCustomerPayload = serde_json::from_value(serde_json::json!({
            "shop_name": "A",
            "shop_type": "garden_center",
            "contact_email": "not-an-email"
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("shop_name"));
        assert!(fields.contains_key("contact_email"));
        assert_eq!(payload.status, RecordStatus::Active);
    }

    #[test]
    fn unknown_shop_type_is_rejected() {
        let result = serde_json::from_value::<CreateCustomerPayload>(serde_json::json!({
            "shop_name": "Acme Grow",
            "shop_type": "supermarket"
        }));
        assert!(result.is_err());
    }
}
