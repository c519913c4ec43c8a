// Authorization middleware for protected routes

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use tracing::debug;

use crate::accounts::repository::AccountStore;
use crate::auth::token::TokenService;
use crate::error::ApiError;
use crate::AppState;

/// Identity of the caller, attached to the request by [`require_auth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when the route sits behind require_auth
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))
    }
}

/// Who initiated an operation, for audit logging
///
/// Unauthenticated callers are recorded by the socket peer address. The
/// `X-Forwarded-For` header is only consulted when no peer address was
/// captured, which assumes a trusted proxy sets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Account(String),
    Address(String),
    Anonymous,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Account(id) => write!(f, "account:{}", id),
            Actor::Address(addr) => write!(f, "ip:{}", addr),
            Actor::Anonymous => write!(f, "anonymous"),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(Actor::Account(identity.account_id.clone()));
        }

        if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(Actor::Address(peer.ip().to_string()));
        }

        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        Ok(match forwarded {
            Some(addr) => Actor::Address(addr.to_string()),
            None => Actor::Anonymous,
        })
    }
}

/// Pull the bearer token out of the Authorization header
///
/// A missing header is an authentication failure; a header that is present
/// but not `Bearer <token>` is invalid input.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))?
        .to_str()
        .map_err(|_| ApiError::InvalidInput("Access Token".to_string()))?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("Bearer") => Ok(token),
        _ => Err(ApiError::InvalidInput("Access Token".to_string())),
    }
}

/// Resolve request headers to a live account identity
///
/// Steps run in order and stop at the first failure: header present, bearer
/// token parsed, signature and expiry verified, account still exists.
pub async fn authorize(
    headers: &HeaderMap,
    tokens: &TokenService,
    accounts: &dyn AccountStore,
) -> Result<Identity, ApiError> {
    let token = bearer_token(headers)?;
    let claims = tokens.verify_access(token)?;

    // Tokens outlive deleted accounts; this lookup is what revokes them
    let account = accounts
        .find_by_id(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(format!("Account no longer exists: {}", claims.sub)))?;

    Ok(Identity {
        account_id: account.id,
    })
}

/// Middleware function gating every protected route
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = authorize(request.headers(), &state.tokens, state.accounts.as_ref()).await?;

    debug!(
        "Authorized account_id={} endpoint={}",
        identity.account_id,
        request.uri().path()
    );
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
