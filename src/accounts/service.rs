// Account service - reads, profile updates and deletion of existing accounts

use std::sync::Arc;
use tracing::{debug, info};

use crate::accounts::{
    models::{Account, AccountChanges, UpdateAccountData},
    repository::{duplicate_email, normalize_email, AccountStore},
};
use crate::auth::{middleware::Actor, password::PasswordService};
use crate::error::ApiError;

/// Service layer for operations on existing accounts
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Fetch an account or fail with NonExistentResource
    pub async fn get(&self, id: &str) -> Result<Account, ApiError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Account", id))
    }

    /// Update an account
    ///
    /// This method:
    /// 1. Verifies the account exists
    /// 2. Rejects an email already used by another account
    /// 3. Re-hashes a new password
    /// 4. Applies the changes
    pub async fn update(
        &self,
        actor: &Actor,
        id: &str,
        data: UpdateAccountData,
    ) -> Result<Account, ApiError> {
        debug!("Account {} update requested by {}", id, actor);
        self.get(id).await?;

        let email = data.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if let Some(other) = self.accounts.find_by_email(email).await? {
                if other.id != id {
                    return Err(duplicate_email(email));
                }
            }
        }

        let password_hash = match data.password {
            Some(password) => Some(PasswordService::hash_password(&password)?),
            None => None,
        };

        let changes = AccountChanges {
            email,
            password_hash,
            name: data.name,
            phone: data.phone,
            birthday: data.birthday,
            deactivated: data.deactivated,
            ..Default::default()
        };

        let updated = self
            .accounts
            .update(id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found("Account", id))?;

        info!("Account {} updated by {}", id, actor);
        Ok(updated)
    }

    /// Delete an account
    ///
    /// Accounts that own a user profile are never deleted; the profile has to
    /// go first.
    pub async fn delete(&self, actor: &Actor, id: &str) -> Result<(), ApiError> {
        let account = self.get(id).await?;

        if account.has_user {
            return Err(ApiError::InvalidOperation(format!(
                "Account has an associated user and cannot be deleted: {}",
                id
            )));
        }

        if !self.accounts.delete(id).await? {
            return Err(ApiError::not_found("Account", id));
        }

        info!("Account {} deleted by {}", id, actor);
        Ok(())
    }
}
