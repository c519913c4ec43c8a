// Request validation at the HTTP boundary
// Bodies are deserialized and validated before any service sees them

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::error::ApiError;

/// JSON body extractor that runs `validator` rules
///
/// Unparseable bodies and failed rules both reject with `InvalidInput`, so
/// every client error shares the `{ status, error }` body.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            ApiError::InvalidInput("data".to_string())
        })?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Usernames must not contain `@`
///
/// Login identifiers are matched against both emails and usernames; keeping
/// `@` out of usernames means the two namespaces never overlap.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.contains('@') {
        return Err(ValidationError::new("username_contains_at"));
    }
    Ok(())
}
