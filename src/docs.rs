// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::users::list_users,
        handlers::users::update_profile,
        handlers::users::update_user,
        handlers::users::reset_password,

        // --- Visits ---
        handlers::visits::list_visits,
        handlers::visits::get_visit,
        handlers::visits::create_visit,
        handlers::visits::update_visit,
        handlers::visits::delete_visit,

        // --- Customers ---
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::create_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,

        // --- Configuration ---
        handlers::configurations::list_configurations,
        handlers::configurations::create_configuration,
        handlers::configurations::update_configuration,
        handlers::configurations::delete_configuration,
    ),
    components(
        schemas(
            models::MessageResponse,

            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::UpdateProfilePayload,
            models::auth::AdminUpdateUserPayload,
            models::auth::ResetPasswordPayload,

            // --- Visits ---
            models::visit::CommercialOutcome,
            models::visit::PriorityLevel,
            models::visit::BrandShare,
            models::visit::SalesBreakdown,
            models::visit::VisitDraft,
            models::visit::Visit,
            models::visit::SaveVisitPayload,
            models::visit::FollowUpFilter,
            models::visit::ScoreCard,
            services::checklist::ChecklistResult,

            // --- Customers ---
            models::customer::ShopType,
            models::customer::RecordStatus,
            models::customer::Customer,
            models::customer::CreateCustomerPayload,
            models::customer::UpdateCustomerPayload,

            // --- Configuration ---
            models::configuration::ConfigType,
            models::configuration::Configuration,
            models::configuration::CreateConfigurationPayload,
            models::configuration::UpdateConfigurationPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Users", description = "Profile and user administration"),
        (name = "Visits", description = "Shop visit reports"),
        (name = "Customers", description = "Shops visited by the sales team"),
        (name = "Configuration", description = "Lookup values used by the visit form")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
