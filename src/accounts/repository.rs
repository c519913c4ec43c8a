// Account store: the persistence collaborator behind authentication

use crate::accounts::models::{Account, AccountChanges, NewAccount};
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Capability the auth core needs from persistence
///
/// Email uniqueness is enforced by the implementation: a `create` or `update`
/// that collides with another account fails with `InvalidOperation`, so
/// concurrent signups racing on one email cannot both succeed.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Match by email (case-insensitive) or exact username
    async fn find_by_email_or_username(&self, identifier: &str) -> Result<Option<Account>, ApiError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ApiError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, ApiError>;

    async fn create(&self, account: NewAccount) -> Result<Account, ApiError>;

    /// Apply a partial update, `Ok(None)` if the account is gone
    async fn update(&self, id: &str, changes: AccountChanges) -> Result<Option<Account>, ApiError>;

    /// Stamp `last_login` with the current time
    async fn record_login(&self, id: &str) -> Result<(), ApiError>;

    /// Returns false when nothing was deleted
    async fn delete(&self, id: &str) -> Result<bool, ApiError>;
}

/// Canonical form emails are stored and compared in
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn duplicate_email(email: &str) -> ApiError {
    ApiError::InvalidOperation(format!("Account already exists with email: {}", email))
}

pub(crate) fn duplicate_username(username: &str) -> ApiError {
    ApiError::InvalidOperation(format!("Account already exists with username: {}", username))
}

const ACCOUNT_COLUMNS: &str = "id, email, username, password_hash, name, phone, birthday, \
     has_user, verified, locked, deactivated, last_login, date_created, date_modified";

const USERNAME_INDEX: &str = "accounts_username_key";

/// Postgres-backed account repository
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a new PgAccountStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Translate unique-index violations into the duplicate-account error
    fn map_write_error(e: sqlx::Error, email: Option<&str>, username: Option<&str>) -> ApiError {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                if db_err.constraint() == Some(USERNAME_INDEX) {
                    return duplicate_username(username.unwrap_or_default());
                }
                return duplicate_email(email.unwrap_or_default());
            }
        }
        ApiError::from(e)
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email_or_username(&self, identifier: &str) -> Result<Option<Account>, ApiError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE LOWER(email) = LOWER($1) OR username = $1 \
             ORDER BY (LOWER(email) = LOWER($1)) DESC LIMIT 1",
            ACCOUNT_COLUMNS
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ApiError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE LOWER(email) = LOWER($1)",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, ApiError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn create(&self, account: NewAccount) -> Result<Account, ApiError> {
        let id = Uuid::new_v4().to_string();

        let created = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (id, email, username, password_hash, name, phone, birthday)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(&id)
        .bind(&account.email)
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(&account.phone)
        .bind(account.birthday)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, Some(account.email.as_str()), account.username.as_deref()))?;

        Ok(created)
    }

    async fn update(&self, id: &str, changes: AccountChanges) -> Result<Option<Account>, ApiError> {
        let updated = sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                name = COALESCE($4, name),
                phone = COALESCE($5, phone),
                birthday = COALESCE($6, birthday),
                has_user = COALESCE($7, has_user),
                verified = COALESCE($8, verified),
                locked = COALESCE($9, locked),
                deactivated = COALESCE($10, deactivated),
                date_modified = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(&changes.name)
        .bind(&changes.phone)
        .bind(changes.birthday)
        .bind(changes.has_user)
        .bind(changes.verified)
        .bind(changes.locked)
        .bind(changes.deactivated)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_write_error(e, changes.email.as_deref(), None))?;

        Ok(updated)
    }

    async fn record_login(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE accounts SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Process-local account store
///
/// Used by `STORAGE=memory` and by the test suite. Uniqueness checks and the
/// write happen under one write lock.
#[derive(Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn email_matches(account: &Account, email: &str) -> bool {
        normalize_email(&account.email) == normalize_email(email)
    }

    fn email_taken(accounts: &HashMap<String, Account>, email: &str, except: Option<&str>) -> bool {
        accounts
            .values()
            .any(|a| Self::email_matches(a, email) && Some(a.id.as_str()) != except)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_email_or_username(&self, identifier: &str) -> Result<Option<Account>, ApiError> {
        let accounts = self.accounts.read().await;
        let by_email = accounts.values().find(|a| Self::email_matches(a, identifier));
        let found = by_email.or_else(|| {
            accounts
                .values()
                .find(|a| a.username.as_deref() == Some(identifier))
        });
        Ok(found.cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ApiError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| Self::email_matches(a, email)).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, ApiError> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, ApiError> {
        let mut accounts = self.accounts.write().await;

        if Self::email_taken(&accounts, &account.email, None) {
            return Err(duplicate_email(&account.email));
        }
        if let Some(username) = &account.username {
            if accounts.values().any(|a| a.username.as_ref() == Some(username)) {
                return Err(duplicate_username(username));
            }
        }

        let now = Utc::now();
        let created = Account {
            id: Uuid::new_v4().to_string(),
            email: account.email,
            username: account.username,
            password_hash: account.password_hash,
            name: account.name,
            phone: account.phone,
            birthday: account.birthday,
            has_user: false,
            verified: false,
            locked: false,
            deactivated: false,
            last_login: None,
            date_created: now,
            date_modified: now,
        };
        accounts.insert(created.id.clone(), created.clone());

        Ok(created)
    }

    async fn update(&self, id: &str, changes: AccountChanges) -> Result<Option<Account>, ApiError> {
        let mut accounts = self.accounts.write().await;

        if let Some(email) = &changes.email {
            if Self::email_taken(&accounts, email, Some(id)) {
                return Err(duplicate_email(email));
            }
        }

        let Some(account) = accounts.get_mut(id) else {
            return Ok(None);
        };

        if let Some(email) = changes.email {
            account.email = email;
        }
        if let Some(hash) = changes.password_hash {
            account.password_hash = hash;
        }
        if let Some(name) = changes.name {
            account.name = Some(name);
        }
        if let Some(phone) = changes.phone {
            account.phone = Some(phone);
        }
        if let Some(birthday) = changes.birthday {
            account.birthday = Some(birthday);
        }
        if let Some(has_user) = changes.has_user {
            account.has_user = has_user;
        }
        if let Some(verified) = changes.verified {
            account.verified = verified;
        }
        if let Some(locked) = changes.locked {
            account.locked = locked;
        }
        if let Some(deactivated) = changes.deactivated {
            account.deactivated = deactivated;
        }
        account.date_modified = Utc::now();

        Ok(Some(account.clone()))
    }

    async fn record_login(&self, id: &str) -> Result<(), ApiError> {
        if let Some(account) = self.accounts.write().await.get_mut(id) {
            account.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, ApiError> {
        Ok(self.accounts.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            username: None,
            password_hash: "hash".to_string(),
            name: None,
            phone: None,
            birthday: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = InMemoryAccountStore::new();
        let created = store.create(new_account("a@b.com")).await.unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(store.find_by_id(&created.id).await.unwrap().unwrap().email, "a@b.com");
        assert!(store.find_by_email("A@B.COM").await.unwrap().is_some());
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_case_insensitively() {
        let store = InMemoryAccountStore::new();
        store.create(new_account("a@b.com")).await.unwrap();

        match store.create(new_account("A@b.com")).await {
            Err(ApiError::InvalidOperation(msg)) => assert!(msg.contains("already exists")),
            other => panic!("Expected InvalidOperation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_ascii_email_matches_case_insensitively() {
        let store = InMemoryAccountStore::new();
        let created = store.create(new_account("a@bücher.de")).await.unwrap();

        let found = store.find_by_email_or_username("a@BÜCHER.de").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(store.find_by_email(" A@Bücher.DE ").await.unwrap().is_some());
        assert!(matches!(
            store.create(new_account("A@BÜCHER.DE")).await,
            Err(ApiError::InvalidOperation(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_signups_only_one_wins() {
        let store = Arc::new(InMemoryAccountStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create(new_account("race@b.com")).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let store = InMemoryAccountStore::new();
        let mut account = new_account("a@b.com");
        account.username = Some("ada".to_string());
        let created = store.create(account).await.unwrap();

        let found = store.find_by_email_or_username("ada").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        let found = store.find_by_email_or_username("a@b.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_update_rejects_email_owned_by_other_account() {
        let store = InMemoryAccountStore::new();
        store.create(new_account("first@b.com")).await.unwrap();
        let second = store.create(new_account("second@b.com")).await.unwrap();

        let changes = AccountChanges {
            email: Some("first@b.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update(&second.id, changes).await,
            Err(ApiError::InvalidOperation(_))
        ));

        // Re-submitting one's own email is fine
        let changes = AccountChanges {
            email: Some("second@b.com".to_string()),
            name: Some("Second".to_string()),
            ..Default::default()
        };
        let updated = store.update(&second.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.name.as_deref(), Some("Second"));
    }

    #[tokio::test]
    async fn test_record_login_and_delete() {
        let store = InMemoryAccountStore::new();
        let created = store.create(new_account("a@b.com")).await.unwrap();
        assert!(created.last_login.is_none());

        store.record_login(&created.id).await.unwrap();
        assert!(store.find_by_id(&created.id).await.unwrap().unwrap().last_login.is_some());

        assert!(store.delete(&created.id).await.unwrap());
        assert!(!store.delete(&created.id).await.unwrap());
    }
}
