pub mod user_repo;
pub use user_repo::UserRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod visit_repo;
pub use visit_repo::VisitRepository;
pub mod configuration_repo;
pub use configuration_repo::ConfigurationRepository;
