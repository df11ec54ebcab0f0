pub mod auth;
pub mod checklist;
pub mod configuration_service;
pub mod customer_service;
pub mod lifecycle;
pub mod scoring;
pub mod user_service;
pub mod visit_service;
