//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use visit_report::{
    config::{AppConfig, AppState},
    docs::ApiDoc,
    handlers,
    middleware::auth::auth_guard,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("✅ Database migrations applied");

    if let Some((email, password)) = &config.bootstrap_admin {
        app_state.auth_service.bootstrap_admin(email, password).await?;
    }

    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Rotas protegidas pelo middleware
    let user_routes = Router::new()
        .route("/", get(handlers::users::list_users))
        .route("/me", get(handlers::auth::get_me))
        .route("/profile", put(handlers::users::update_profile))
        .route("/{id}", put(handlers::users::update_user))
        .route("/{id}/reset-password", post(handlers::users::reset_password));

    let visit_routes = Router::new()
        .route("/"
               ,get(handlers::visits::list_visits)
               .post(handlers::visits::create_visit)
        )
        .route("/{id}"
               ,get(handlers::visits::get_visit)
               .put(handlers::visits::update_visit)
               .delete(handlers::visits::delete_visit)
        );

    let customer_routes = Router::new()
        .route("/"
               ,get(handlers::customers::list_customers)
               .post(handlers::customers::create_customer)
        )
        .route("/{id}"
               ,get(handlers::customers::get_customer)
               .put(handlers::customers::update_customer)
               .delete(handlers::customers::delete_customer)
        );

    let config_routes = Router::new()
        .route("/"
               ,get(handlers::configurations::list_configurations)
               .post(handlers::configurations::create_configuration)
        )
        .route("/{id}"
               ,put(handlers::configurations::update_configuration)
               .delete(handlers::configurations::delete_configuration)
        );

    let protected_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/visits", visit_routes)
        .nest("/customers", customer_routes)
        .nest("/config", config_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Axum server error")?;
    Ok(())
}
