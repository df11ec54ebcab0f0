pub mod auth;
pub mod configurations;
pub mod customers;
pub mod users;
pub mod visits;
