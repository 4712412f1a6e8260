/// JWT Claims structure
///
/// Represents the payload of a JWT token containing user identity,
/// role and standard JWT claims (RFC 7519).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::rbac::Role;
use crate::error::{AppError, AuthError};

/// Claim value distinguishing access tokens from refresh tokens
pub const TOKEN_USE_ACCESS: &str = "access";
pub const TOKEN_USE_REFRESH: &str = "refresh";

/// JWT Claims for access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// User role (admin / instructor / student)
    pub role: String,
    /// Token usage: "access" or "refresh"
    pub token_use: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Create new claims binding a user identity and role to a token use
    pub fn new(
        user_id: Uuid,
        role: Role,
        token_use: &str,
        expiry_seconds: i64,
        issuer: String,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            token_use: token_use.to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns error if user ID is not a valid UUID
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }

    /// Extract the role from claims
    ///
    /// # Errors
    /// Returns error if the role claim is not a known role
    pub fn role(&self) -> Result<Role, AppError> {
        Role::parse(&self.role).map_err(|_| AppError::Auth(AuthError::TokenInvalid))
    }

    /// Check if token has expired
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(
            user_id,
            Role::Student,
            TOKEN_USE_ACCESS,
            3600,
            "test".to_string(),
        );

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "student");
        assert_eq!(claims.token_use, "access");
        assert_eq!(claims.iss, "test");
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(
            user_id,
            Role::Admin,
            TOKEN_USE_ACCESS,
            3600,
            "test".to_string(),
        );

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(
            Uuid::new_v4(),
            Role::Student,
            TOKEN_USE_ACCESS,
            3600,
            "test".to_string(),
        );
        claims.sub = "invalid-uuid".to_string();

        assert!(claims.user_id().is_err());
    }

    #[test]
    fn test_role_extraction() {
        let claims = Claims::new(
            Uuid::new_v4(),
            Role::Instructor,
            TOKEN_USE_ACCESS,
            3600,
            "test".to_string(),
        );

        assert_eq!(claims.role().unwrap(), Role::Instructor);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let mut claims = Claims::new(
            Uuid::new_v4(),
            Role::Student,
            TOKEN_USE_ACCESS,
            3600,
            "test".to_string(),
        );
        claims.role = "superuser".to_string();

        assert!(claims.role().is_err());
    }
}
