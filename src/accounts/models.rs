// Account data models and DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Account database model
///
/// `password_hash` holds an Argon2 PHC string and never leaves the process;
/// use [`AccountView`] for anything returned to a client.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub username: Option<String>,
    pub password_hash: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub has_user: bool,
    pub verified: bool,
    pub locked: bool,
    pub deactivated: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

/// Account response model (excludes password_hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[schema(example = "5f0c3a9e-1f0b-4b8e-9a53-0d3c8f0b1a2c")]
    pub id: String,
    #[schema(example = "a@b.com")]
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub has_user: bool,
    pub verified: bool,
    pub locked: bool,
    pub deactivated: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            username: account.username,
            name: account.name,
            phone: account.phone,
            birthday: account.birthday,
            has_user: account.has_user,
            verified: account.verified,
            locked: account.locked,
            deactivated: account.deactivated,
            last_login: account.last_login,
            date_created: account.date_created,
            date_modified: account.date_modified,
        }
    }
}

/// Fields needed to persist a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub username: Option<String>,
    pub password_hash: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Partial update applied by the store; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub has_user: Option<bool>,
    pub verified: Option<bool>,
    pub locked: Option<bool>,
    pub deactivated: Option<bool>,
}

/// Fields a caller may change on their own account
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountData {
    #[validate(email)]
    #[schema(example = "new@b.com")]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub deactivated: Option<bool>,
}

/// PATCH /accounts/me request body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountRequest {
    #[validate]
    pub data: UpdateAccountData,
}

/// Single-account response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub account: AccountView,
}
