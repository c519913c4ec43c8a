pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use accounts::{AccountService, AccountStore, InMemoryAccountStore, PgAccountStore};
use auth::{AuthService, TokenService};
use config::{AuthConfig, Config, StorageKind};
use error::ApiError;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::signup_handler,
        auth::handlers::login_handler,
        auth::handlers::refresh_handler,
        accounts::handlers::me_handler,
        accounts::handlers::update_me_handler,
        accounts::handlers::delete_me_handler,
        accounts::handlers::get_account_handler,
    ),
    components(
        schemas(
            auth::models::SignupRequest,
            auth::models::SignupData,
            auth::models::LoginRequest,
            auth::models::LoginData,
            auth::models::RefreshRequest,
            auth::models::RefreshData,
            auth::models::AuthResponse,
            auth::models::RefreshResponse,
            auth::models::AccessToken,
            auth::token::TokenPair,
            accounts::models::AccountView,
            accounts::models::AccountResponse,
            accounts::models::UpdateAccountRequest,
            accounts::models::UpdateAccountData,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Signup, login and token refresh"),
        (name = "accounts", description = "Operations on the authenticated account")
    ),
    info(
        title = "Tribe API",
        version = "0.1.0",
        description = "Accounts and JWT authentication for the Tribe social backend"
    )
)]
struct ApiDoc;

/// Registers the bearer scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
///
/// Built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub accounts: Arc<dyn AccountStore>,
    pub auth_service: Arc<AuthService>,
    pub account_service: Arc<AccountService>,
}

impl AppState {
    /// Wire services over an account store
    ///
    /// Fails with a configuration error if the token settings are unusable.
    pub fn new(auth: &AuthConfig, accounts: Arc<dyn AccountStore>) -> Result<Self, ApiError> {
        let tokens = Arc::new(TokenService::new(auth)?);

        Ok(Self {
            auth_service: Arc::new(AuthService::new(accounts.clone(), tokens.clone())),
            account_service: Arc::new(AccountService::new(accounts.clone())),
            tokens,
            accounts,
        })
    }
}

/// Handler for GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Creates and configures the application router
/// Public auth routes, protected account routes, Swagger UI, tracing and CORS
pub fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route(
            "/accounts/me",
            get(accounts::handlers::me_handler)
                .patch(accounts::handlers::update_me_handler)
                .delete(accounts::handlers::delete_me_handler),
        )
        .route("/accounts/:id", get(accounts::handlers::get_account_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .route("/auth/signup", post(auth::handlers::signup_handler))
        .route("/auth/login", post(auth::handlers::login_handler))
        .route("/auth/refresh", post(auth::handlers::refresh_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Build the account store selected by configuration
async fn create_store(config: &Config) -> Result<Arc<dyn AccountStore>, ApiError> {
    match config.storage {
        StorageKind::Memory => {
            tracing::warn!("Using in-memory account storage; data is lost on restart");
            Ok(Arc::new(InMemoryAccountStore::new()))
        }
        StorageKind::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                ApiError::Configuration("DATABASE_URL must be set when STORAGE=postgres".to_string())
            })?;

            tracing::info!("Connecting to database...");
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool)
                .await
                .map_err(|e| ApiError::Server(format!("migrations failed: {}", e)))?;

            Ok(Arc::new(PgAccountStore::new(pool)))
        }
    }
}

async fn run() -> Result<(), ApiError> {
    // Configuration errors stop the process here, before any socket is bound
    let config = Config::from_env()?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let store = create_store(&config).await?;
    let state = AppState::new(&config.auth, store)?;
    let app = create_router(state);

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ApiError::Server(format!("failed to bind {}: {}", addr, e)))?;

    tracing::info!("Tribe API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| ApiError::Server(format!("server error: {}", e)))
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Tribe API - Starting...");

    if let Err(e) = run().await {
        tracing::error!("Fatal: {}", e);
        std::process::exit(1);
    }
}
