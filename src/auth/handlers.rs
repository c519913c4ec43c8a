// HTTP handlers for authentication endpoints

use axum::{extract::State, Json};

use crate::auth::{
    middleware::Actor,
    models::{AccessToken, AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, SignupRequest},
};
use crate::error::ApiError;
use crate::validation::ValidatedJson;
use crate::AppState;

/// Register a new account
/// POST /auth/signup
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input or email already registered", body = String, example = json!({"status": "error", "error": "Account already exists with email: a@b.com"}))
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(state): State<AppState>,
    actor: Actor,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let result = state.auth_service.register(&actor, request.data).await?;
    Ok(Json(result.into()))
}

/// Log in with email/username and password
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = AuthResponse),
        (status = 400, description = "Unknown account or wrong password", body = String, example = json!({"status": "error", "error": "Invalid credentials provided"}))
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    actor: Actor,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let result = state.auth_service.authenticate(&actor, request.data).await?;
    Ok(Json(result.into()))
}

/// Exchange a refresh token for a new access token
/// POST /auth/refresh
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Refresh token invalid or expired", body = String, example = json!({"status": "error", "error": "Invalid or malformed token provided"}))
    ),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<AppState>,
    actor: Actor,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let access = state.auth_service.refresh(&actor, request.data).await?;
    Ok(Json(RefreshResponse {
        tokens: AccessToken { access },
    }))
}
