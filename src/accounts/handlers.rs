// HTTP handlers for account endpoints (all behind require_auth)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::accounts::models::{AccountResponse, UpdateAccountRequest};
use crate::auth::middleware::{Actor, Identity};
use crate::error::ApiError;
use crate::validation::ValidatedJson;
use crate::AppState;

/// Get the caller's account
/// GET /accounts/me
#[utoipa::path(
    get,
    path = "/accounts/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Missing or invalid access token", body = String, example = json!({"status": "error", "error": "Missing authentication token"}))
    ),
    security(("bearer_auth" = [])),
    tag = "accounts"
)]
pub async fn me_handler(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.account_service.get(&identity.account_id).await?;
    Ok(Json(AccountResponse {
        account: account.into(),
    }))
}

/// Update the caller's account
/// PATCH /accounts/me
#[utoipa::path(
    patch,
    path = "/accounts/me",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 400, description = "Invalid input or email in use", body = String),
        (status = 401, description = "Missing or invalid access token", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "accounts"
)]
pub async fn update_me_handler(
    State(state): State<AppState>,
    identity: Identity,
    actor: Actor,
    ValidatedJson(request): ValidatedJson<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .account_service
        .update(&actor, &identity.account_id, request.data)
        .await?;
    Ok(Json(AccountResponse {
        account: account.into(),
    }))
}

/// Delete the caller's account
/// DELETE /accounts/me
#[utoipa::path(
    delete,
    path = "/accounts/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Account still owns a user profile", body = String),
        (status = 401, description = "Missing or invalid access token", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "accounts"
)]
pub async fn delete_me_handler(
    State(state): State<AppState>,
    identity: Identity,
    actor: Actor,
) -> Result<StatusCode, ApiError> {
    state.account_service.delete(&actor, &identity.account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get an account by id
/// GET /accounts/{id}
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    params(
        ("id" = String, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account found", body = AccountResponse),
        (status = 404, description = "Account not found", body = String, example = json!({"status": "error", "error": "Account does not exist: 42"})),
        (status = 401, description = "Missing or invalid access token", body = String)
    ),
    security(("bearer_auth" = [])),
    tag = "accounts"
)]
pub async fn get_account_handler(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.account_service.get(&id).await?;
    Ok(Json(AccountResponse {
        account: account.into(),
    }))
}
