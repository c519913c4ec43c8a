// Authentication request/response DTOs

use crate::accounts::models::{Account, AccountView};
use crate::auth::token::TokenPair;
use crate::validation::validate_username;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Registration payload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignupData {
    #[validate(email)]
    #[schema(example = "a@b.com")]
    pub email: String,
    #[validate(length(min = 1))]
    #[schema(example = "pw")]
    pub password: String,
    #[validate(length(min = 1), custom = "validate_username")]
    pub username: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// POST /auth/signup request body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate]
    pub data: SignupData,
}

/// Login payload; `identifier` is an email or a username
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginData {
    #[validate(length(min = 1))]
    #[schema(example = "a@b.com")]
    pub identifier: String,
    #[validate(length(min = 1))]
    #[schema(example = "pw")]
    pub password: String,
}

/// POST /auth/login request body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate]
    pub data: LoginData,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshData {
    #[validate(length(min = 1))]
    pub refresh: String,
}

/// POST /auth/refresh request body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate]
    pub data: RefreshData,
}

/// Outcome of a successful signup or login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub account: Account,
    pub tokens: TokenPair,
}

/// Authentication response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub account: AccountView,
    pub tokens: TokenPair,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            account: result.account.into(),
            tokens: result.tokens,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessToken {
    pub access: String,
}

/// Token refresh response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub tokens: AccessToken,
}
