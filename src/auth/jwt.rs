/// JWT Token Generation and Validation
///
/// Handles creation and validation of the access/refresh token pair.
/// Both tokens are signed, expiring claim sets; the `token_use` claim
/// keeps one from standing in for the other.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, TOKEN_USE_ACCESS, TOKEN_USE_REFRESH};
use crate::auth::rbac::Role;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Access/refresh token pair issued at login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issue a new access/refresh token pair for a user
///
/// The access token expiry is the configured `access_token_expiry`,
/// strictly shorter than `refresh_token_expiry`.
///
/// # Errors
/// Returns error if token signing fails
pub fn issue_token_pair(
    user_id: &Uuid,
    role: Role,
    config: &JwtSettings,
) -> Result<TokenPair, AppError> {
    let access = encode_token(&Claims::new(
        *user_id,
        role,
        TOKEN_USE_ACCESS,
        config.access_token_expiry,
        config.issuer.clone(),
    ), config)?;

    let refresh = encode_token(&Claims::new(
        *user_id,
        role,
        TOKEN_USE_REFRESH,
        config.refresh_token_expiry,
        config.issuer.clone(),
    ), config)?;

    Ok(TokenPair { access, refresh })
}

fn encode_token(claims: &Claims, config: &JwtSettings) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token and extract its claims
///
/// # Errors
/// Returns error if the token is invalid, expired, tampered with,
/// or is not an access token
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let claims = decode_token(token, config)?;
    if claims.token_use != TOKEN_USE_ACCESS {
        tracing::warn!("Refresh token presented where an access token was expected");
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }
    Ok(claims)
}

/// Validate a refresh token and extract its claims
///
/// # Errors
/// Returns error if the token is invalid, expired, tampered with,
/// or is not a refresh token
pub fn validate_refresh_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let claims = decode_token(token, config)?;
    if claims.token_use != TOKEN_USE_REFRESH {
        tracing::warn!("Access token presented where a refresh token was expected");
        return Err(AppError::Auth(AuthError::TokenInvalid));
    }
    Ok(claims)
}

fn decode_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Verify issuer matches configuration
    validation.set_issuer(&[&config.issuer]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("JWT validation error: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::Auth(AuthError::TokenExpired)
            }
            _ => AppError::Auth(AuthError::TokenInvalid),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
        }
    }

    #[test]
    fn test_issue_and_validate_pair() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let pair =
            issue_token_pair(&user_id, Role::Student, &config).expect("Failed to issue tokens");

        let access_claims =
            validate_access_token(&pair.access, &config).expect("Failed to validate access token");
        assert_eq!(access_claims.sub, user_id.to_string());
        assert_eq!(access_claims.role, "student");
        assert_eq!(access_claims.iss, "test");

        let refresh_claims = validate_refresh_token(&pair.refresh, &config)
            .expect("Failed to validate refresh token");
        assert_eq!(refresh_claims.sub, user_id.to_string());
    }

    #[test]
    fn test_access_expiry_shorter_than_refresh() {
        let config = get_test_config();
        let pair = issue_token_pair(&Uuid::new_v4(), Role::Admin, &config)
            .expect("Failed to issue tokens");

        let access = validate_access_token(&pair.access, &config).unwrap();
        let refresh = validate_refresh_token(&pair.refresh, &config).unwrap();
        assert!(access.exp < refresh.exp);
    }

    #[test]
    fn test_token_use_confusion_rejected() {
        let config = get_test_config();
        let pair = issue_token_pair(&Uuid::new_v4(), Role::Student, &config)
            .expect("Failed to issue tokens");

        // A refresh token is not accepted as an access token, and vice versa
        assert!(validate_access_token(&pair.refresh, &config).is_err());
        assert!(validate_refresh_token(&pair.access, &config).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let config = get_test_config();
        let result = validate_access_token("invalid.token.here", &config);

        assert!(result.is_err());
    }

    #[test]
    fn test_tampered_token() {
        let config = get_test_config();

        let pair = issue_token_pair(&Uuid::new_v4(), Role::Student, &config)
            .expect("Failed to issue tokens");

        // Tamper with token
        let tampered = format!("{}X", pair.access);
        let result = validate_access_token(&tampered, &config);

        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let mut config = get_test_config();

        let pair = issue_token_pair(&Uuid::new_v4(), Role::Student, &config)
            .expect("Failed to issue tokens");

        // Change issuer in validation config
        config.issuer = "wrong-issuer".to_string();
        let result = validate_access_token(&pair.access, &config);

        assert!(result.is_err());
    }
}
