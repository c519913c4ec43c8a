// Authentication service - business logic layer

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::accounts::{
    models::NewAccount,
    repository::{duplicate_email, normalize_email, AccountStore},
};
use crate::auth::{
    middleware::Actor,
    models::{AuthResult, LoginData, RefreshData, SignupData},
    password::PasswordService,
    token::TokenService,
};
use crate::error::ApiError;

/// Authentication service coordinating signup, login and token refresh
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(accounts: Arc<dyn AccountStore>, tokens: Arc<TokenService>) -> Self {
        Self { accounts, tokens }
    }

    /// Register a new account
    ///
    /// This method:
    /// 1. Rejects an email that is already registered
    /// 2. Hashes the password
    /// 3. Persists the account (the store re-checks uniqueness)
    /// 4. Issues a token pair
    pub async fn register(&self, actor: &Actor, data: SignupData) -> Result<AuthResult, ApiError> {
        let email = normalize_email(&data.email);
        debug!("Signup requested by {} for {}", actor, email);

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(duplicate_email(&email));
        }

        let password_hash = PasswordService::hash_password(&data.password)?;

        let account = self
            .accounts
            .create(NewAccount {
                email,
                username: data.username,
                password_hash,
                name: data.name,
                phone: data.phone,
                birthday: data.birthday,
            })
            .await?;

        let tokens = self.tokens.issue_pair(&account.id)?;

        info!("Account {} registered by {}", account.id, actor);
        Ok(AuthResult { account, tokens })
    }

    /// Log in with an email or username and a password
    ///
    /// An unknown identifier is reported as such; a wrong password always
    /// yields the same message.
    pub async fn authenticate(&self, actor: &Actor, data: LoginData) -> Result<AuthResult, ApiError> {
        debug!("Login requested by {} for {}", actor, data.identifier);

        let account = self
            .accounts
            .find_by_email_or_username(&data.identifier)
            .await?
            .ok_or_else(|| {
                ApiError::InvalidOperation(format!("Account does not exist: {}", data.identifier))
            })?;

        if !PasswordService::verify_password(&data.password, &account.password_hash)? {
            warn!("Failed login for account {} from {}", account.id, actor);
            return Err(ApiError::InvalidOperation("Invalid credentials provided".to_string()));
        }

        let tokens = self.tokens.issue_pair(&account.id)?;
        self.accounts.record_login(&account.id).await?;

        info!("Account {} logged in from {}", account.id, actor);
        Ok(AuthResult { account, tokens })
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(&self, actor: &Actor, data: RefreshData) -> Result<String, ApiError> {
        let access = self.tokens.renew_access(&data.refresh)?;
        debug!("Access token renewed for {}", actor);
        Ok(access)
    }
}
