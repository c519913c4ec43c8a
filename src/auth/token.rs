// JWT token generation and validation service

use crate::{
    config::{AuthConfig, MAX_LIFETIME_SECS},
    error::ApiError,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Purpose a token was issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    #[serde(rename = "tokenType")]
    pub token_type: TokenType,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

/// Freshly issued access/refresh pair
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signing material for one token kind
struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: i64, // in seconds
}

impl SigningKey {
    fn new(secret: &str, lifetime: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }
}

/// Token service for JWT operations
///
/// Access and refresh tokens use separate secrets and lifetimes. Tokens are
/// stateless: validity is decided by signature, expiry and the type claim.
pub struct TokenService {
    access: SigningKey,
    refresh: SigningKey,
    validation: Validation,
}

impl TokenService {
    /// Build the service from configuration
    ///
    /// Empty secrets and lifetimes that are non-positive or above
    /// [`MAX_LIFETIME_SECS`] are a configuration error.
    pub fn new(config: &AuthConfig) -> Result<Self, ApiError> {
        if config.access_secret.is_empty() {
            return Err(ApiError::Configuration("access token secret is not configured".to_string()));
        }
        if config.refresh_secret.is_empty() {
            return Err(ApiError::Configuration("refresh token secret is not configured".to_string()));
        }
        if config.access_lifetime <= 0 {
            return Err(ApiError::Configuration("access token lifetime is not configured".to_string()));
        }
        if config.refresh_lifetime <= 0 {
            return Err(ApiError::Configuration("refresh token lifetime is not configured".to_string()));
        }
        if config.access_lifetime > MAX_LIFETIME_SECS || config.refresh_lifetime > MAX_LIFETIME_SECS {
            return Err(ApiError::Configuration(format!(
                "token lifetimes may not exceed {} seconds",
                MAX_LIFETIME_SECS
            )));
        }

        // Expiry is checked to the second
        let mut validation = Validation::default();
        validation.leeway = 0;

        Ok(Self {
            access: SigningKey::new(&config.access_secret, config.access_lifetime),
            refresh: SigningKey::new(&config.refresh_secret, config.refresh_lifetime),
            validation,
        })
    }

    /// Generate both access and refresh tokens
    pub fn issue_pair(&self, account_id: &str) -> Result<TokenPair, ApiError> {
        Ok(TokenPair {
            access: self.issue_access(account_id)?,
            refresh: self.issue_refresh(account_id)?,
        })
    }

    /// Generate an access token
    pub fn issue_access(&self, account_id: &str) -> Result<String, ApiError> {
        self.sign(account_id, TokenType::Access)
    }

    /// Generate a refresh token
    pub fn issue_refresh(&self, account_id: &str) -> Result<String, ApiError> {
        self.sign(account_id, TokenType::Refresh)
    }

    /// Validate an access token
    pub fn verify_access(&self, token: &str) -> Result<Claims, ApiError> {
        self.verify(token, TokenType::Access)
    }

    /// Validate a refresh token
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, ApiError> {
        self.verify(token, TokenType::Refresh)
    }

    /// Mint a new access token for the subject of a valid refresh token
    pub fn renew_access(&self, refresh_token: &str) -> Result<String, ApiError> {
        let claims = self.verify_refresh(refresh_token)?;
        self.issue_access(&claims.sub)
    }

    fn key(&self, token_type: TokenType) -> &SigningKey {
        match token_type {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        }
    }

    fn sign(&self, account_id: &str, token_type: TokenType) -> Result<String, ApiError> {
        let key = self.key(token_type);
        let now = Utc::now().timestamp();
        let exp = now.checked_add(key.lifetime).ok_or_else(|| {
            ApiError::Server(format!("{} token expiry overflows", token_type))
        })?;

        let claims = Claims {
            sub: account_id.to_string(),
            token_type,
            iat: now,
            exp,
        };

        encode(&Header::default(), &claims, &key.encoding)
            .map_err(|e| ApiError::Server(format!("failed to sign {} token: {}", token_type, e)))
    }

    /// Internal helper to validate any token
    fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, ApiError> {
        let claims = decode::<Claims>(token, &self.key(expected).decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected {} token: {}", expected, e);
                ApiError::Unauthorized("Invalid or malformed token provided".to_string())
            })?;

        if claims.token_type != expected {
            tracing::debug!("Token of type {} presented as {}", claims.token_type, expected);
            return Err(ApiError::Unauthorized("Invalid or malformed token provided".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) const ACCESS_SECRET: &str = "test_access_secret_for_testing_purposes";
    pub(crate) const REFRESH_SECRET: &str = "test_refresh_secret_for_testing_purposes";

    pub(crate) fn test_auth_config() -> AuthConfig {
        AuthConfig {
            access_secret: ACCESS_SECRET.to_string(),
            access_lifetime: 900,
            refresh_secret: REFRESH_SECRET.to_string(),
            refresh_lifetime: 604_800,
        }
    }

    // Helper to create a test token service
    pub(crate) fn test_token_service() -> TokenService {
        TokenService::new(&test_auth_config()).unwrap()
    }

    fn expired_token(secret: &str, token_type: TokenType) -> String {
        let claims = Claims {
            sub: "account-1".to_string(),
            token_type,
            iat: Utc::now().timestamp() - 1000,
            exp: Utc::now().timestamp() - 500, // Expired 500 seconds ago
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_new_rejects_missing_configuration() {
        let mut config = test_auth_config();
        config.access_secret = String::new();
        assert!(matches!(TokenService::new(&config), Err(ApiError::Configuration(_))));

        let mut config = test_auth_config();
        config.refresh_secret = String::new();
        assert!(matches!(TokenService::new(&config), Err(ApiError::Configuration(_))));

        let mut config = test_auth_config();
        config.access_lifetime = 0;
        assert!(matches!(TokenService::new(&config), Err(ApiError::Configuration(_))));

        let mut config = test_auth_config();
        config.refresh_lifetime = -1;
        assert!(matches!(TokenService::new(&config), Err(ApiError::Configuration(_))));
    }

    #[test]
    fn test_new_rejects_oversized_lifetimes() {
        let mut config = test_auth_config();
        config.access_lifetime = i64::MAX;
        assert!(matches!(TokenService::new(&config), Err(ApiError::Configuration(_))));

        let mut config = test_auth_config();
        config.refresh_lifetime = MAX_LIFETIME_SECS + 1;
        assert!(matches!(TokenService::new(&config), Err(ApiError::Configuration(_))));

        // The largest accepted lifetime still signs
        let mut config = test_auth_config();
        config.refresh_lifetime = MAX_LIFETIME_SECS;
        let service = TokenService::new(&config).unwrap();
        let claims = service.verify_refresh(&service.issue_refresh("account-1").unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_LIFETIME_SECS);
    }

    #[test]
    fn test_lifetimes_follow_configuration() {
        let service = test_token_service();
        let pair = service.issue_pair("account-1").unwrap();

        let access = service.verify_access(&pair.access).unwrap();
        assert_eq!(access.exp - access.iat, 900);

        let refresh = service.verify_refresh(&pair.refresh).unwrap();
        assert_eq!(refresh.exp - refresh.iat, 604_800);
    }

    #[test]
    fn test_refresh_token_carries_refresh_type() {
        let service = test_token_service();
        let refresh = service.issue_refresh("account-1").unwrap();
        let claims = service.verify_refresh(&refresh).unwrap();
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_type_claim_serializes_as_token_type() {
        let claims = Claims {
            sub: "a".to_string(),
            token_type: TokenType::Refresh,
            exp: 2,
            iat: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["tokenType"], "refresh");
    }

    #[test]
    fn test_tokens_rejected_for_wrong_purpose() {
        let service = test_token_service();
        let pair = service.issue_pair("account-1").unwrap();

        // Different secrets already keep them apart
        assert!(service.verify_access(&pair.refresh).is_err());
        assert!(service.verify_refresh(&pair.access).is_err());
        assert!(service.renew_access(&pair.access).is_err());
    }

    #[test]
    fn test_type_claim_checked_even_with_shared_secret() {
        let mut config = test_auth_config();
        config.refresh_secret = config.access_secret.clone();
        let service = TokenService::new(&config).unwrap();

        let refresh = service.issue_refresh("account-1").unwrap();
        assert!(matches!(service.verify_access(&refresh), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_renew_access_round_trip() {
        let service = test_token_service();
        let pair = service.issue_pair("account-42").unwrap();

        let access = service.renew_access(&pair.refresh).unwrap();
        let claims = service.verify_access(&access).unwrap();
        assert_eq!(claims.sub, "account-42");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_verification_is_repeatable() {
        let service = test_token_service();
        let access = service.issue_access("account-7").unwrap();

        let first = service.verify_access(&access).unwrap();
        let second = service.verify_access(&access).unwrap();
        assert_eq!(first.sub, second.sub);
    }

    #[test]
    fn test_expired_tokens_are_rejected() {
        let service = test_token_service();

        let access = expired_token(ACCESS_SECRET, TokenType::Access);
        assert!(matches!(service.verify_access(&access), Err(ApiError::Unauthorized(_))));

        let refresh = expired_token(REFRESH_SECRET, TokenType::Refresh);
        assert!(matches!(service.renew_access(&refresh), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_token_service();

        assert!(service.verify_access("").is_err());
        assert!(service.verify_access("not.a.token").is_err());
        assert!(service.verify_access("invalid_token_format").is_err());
        assert!(service
            .verify_access("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature")
            .is_err());
        assert!(service.renew_access("garbage").is_err());
    }

    #[test]
    fn test_primitive_payload_is_rejected() {
        let service = test_token_service();
        let token = encode(
            &Header::default(),
            &"account-1",
            &EncodingKey::from_secret(REFRESH_SECRET.as_bytes()),
        )
        .unwrap();

        match service.renew_access(&token) {
            Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, "Invalid or malformed token provided"),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_token_signature_verification() {
        let service1 = test_token_service();
        let mut config = test_auth_config();
        config.access_secret = "another_access_secret".to_string();
        let service2 = TokenService::new(&config).unwrap();

        let token = service1.issue_access("account-1").unwrap();
        assert!(service1.verify_access(&token).is_ok());
        assert!(service2.verify_access(&token).is_err());
    }

    // Property-based tests using proptest

    proptest! {
        #[test]
        fn prop_renew_access_preserves_subject(account_id in "[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{12}") {
            let service = test_token_service();
            let pair = service.issue_pair(&account_id)?;
            let access = service.renew_access(&pair.refresh)?;
            let claims = service.verify_access(&access)?;
            prop_assert_eq!(claims.sub, account_id);
        }

        #[test]
        fn prop_malformed_tokens_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            let service = test_token_service();
            prop_assert!(service.verify_access(&malformed).is_err());
            prop_assert!(service.renew_access(&malformed).is_err());
        }
    }
}
