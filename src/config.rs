// src/config.rs

use std::{env, str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{ConfigurationRepository, CustomerRepository, UserRepository, VisitRepository},
    services::{
        auth::AuthService, configuration_service::ConfigurationService,
        customer_service::CustomerService, user_service::UserService,
        visit_service::VisitService,
    },
};

/// Configuração lida do ambiente (com `.env` opcional).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub jwt_ttl: chrono::Duration,
    pub autosave_interval: Duration,
    /// (email, senha) do primeiro administrador, usado só com a base vazia.
    pub bootstrap_admin: Option<(String, String)>,
}

impl AppConfig {
    pub const DEFAULT_BIND_ADDR: &'static str = "0.0.0.0:3000";

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .with_context(|| format!("{key} must be set"))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| Self::DEFAULT_BIND_ADDR.to_string());
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5u32)?;
        let acquire_timeout_secs = parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 3u64)?;
        let jwt_ttl_days = parse_or(&lookup, "JWT_TTL_DAYS", 7i64)?;
        let autosave_secs = parse_or(&lookup, "AUTOSAVE_INTERVAL_SECS", 30u64)?;

        if autosave_secs == 0 {
            anyhow::bail!("AUTOSAVE_INTERVAL_SECS must be greater than zero");
        }

        let bootstrap_admin = match (
            lookup("BOOTSTRAP_ADMIN_EMAIL"),
            lookup("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            jwt_ttl: chrono::Duration::days(jwt_ttl_days),
            autosave_interval: Duration::from_secs(autosave_secs),
            bootstrap_admin,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub visit_service: VisitService,
    pub customer_service: CustomerService,
    pub configuration_service: ConfigurationService,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("Failed to connect to the database")?;

        tracing::info!("✅ Database connection established");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let visit_repo = VisitRepository::new();
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let configuration_repo = ConfigurationRepository::new();

        let auth_service =
            AuthService::new(user_repo.clone(), config.jwt_secret.clone(), config.jwt_ttl);
        let user_service = UserService::new(user_repo, db_pool.clone());
        let visit_service = VisitService::new(visit_repo.clone());
        let customer_service = CustomerService::new(customer_repo, visit_repo);
        let configuration_service = ConfigurationService::new(configuration_repo);

        Ok(Self {
            db_pool,
            auth_service,
            user_service,
            visit_service,
            customer_service,
            configuration_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/visits"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.jwt_ttl, chrono::Duration::days(7));
        assert_eq!(config.autosave_interval, Duration::from_secs(30));
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://localhost/visits",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn invalid_numbers_are_reported_with_the_key() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/visits"),
            ("JWT_SECRET", "secret"),
            ("AUTOSAVE_INTERVAL_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("AUTOSAVE_INTERVAL_SECS"));
    }

    #[test]
    fn overrides_and_bootstrap_admin_are_read() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/visits"),
            ("JWT_SECRET", "secret"),
            ("AUTOSAVE_INTERVAL_SECS", "10"),
            ("BOOTSTRAP_ADMIN_EMAIL", "admin@canna.com"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "change-me-now"),
        ]))
        .unwrap();

        assert_eq!(config.autosave_interval, Duration::from_secs(10));
        assert_eq!(
            config.bootstrap_admin,
            Some(("admin@canna.com".to_string(), "change-me-now".to_string()))
        );
    }
}
