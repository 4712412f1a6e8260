/// Password Reset Tokens
///
/// Deterministic, tamper-evident tokens derived from {user id, current
/// password hash, issuance timestamp, server secret}. A token stays valid
/// only while the password hash it was derived from is still the stored
/// hash and the expiry window has not elapsed. Consuming a token re-hashes
/// the password, which invalidates every outstanding token for that user;
/// no server-side token state is kept.
///
/// Wire format: `<ts_b36>-<hmac_hex>`, carried alongside a separately
/// encoded uid fragment (URL-safe base64 of the user id).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AppError, AuthError};

type HmacSha256 = Hmac<Sha256>;

/// Default validity window for issued reset tokens: one day
pub const DEFAULT_RESET_TIMEOUT_SECONDS: i64 = 86_400;

/// Issues and validates password reset tokens.
///
/// Constructed once at process start from the configured secret and
/// timeout, and shared with request handlers; no hidden global state.
#[derive(Clone)]
pub struct ResetTokenGenerator {
    secret: String,
    timeout_seconds: i64,
}

impl ResetTokenGenerator {
    pub fn new(secret: impl Into<String>, timeout_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            timeout_seconds,
        }
    }

    /// Generate a token bound to the user's identity and current password hash
    ///
    /// # Errors
    /// Returns error if the HMAC cannot be keyed
    pub fn make_token(&self, user_id: &Uuid, password_hash: &str) -> Result<String, AppError> {
        self.make_token_at(user_id, password_hash, Utc::now().timestamp())
    }

    fn make_token_at(
        &self,
        user_id: &Uuid,
        password_hash: &str,
        issued_at: i64,
    ) -> Result<String, AppError> {
        let signature = self.signature(user_id, password_hash, issued_at)?;
        Ok(format!("{}-{}", to_base36(issued_at), hex::encode(signature)))
    }

    /// Validate a token against the user's *current* password hash and the
    /// expiry window
    ///
    /// Any change to the stored hash since issuance (reset consumption or a
    /// direct password change) fails the signature check.
    ///
    /// # Errors
    /// Returns `InvalidResetToken` on malformed, tampered, superseded or
    /// expired tokens
    pub fn check_token(
        &self,
        user_id: &Uuid,
        password_hash: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let (ts_part, sig_part) = token
            .split_once('-')
            .ok_or(AppError::Auth(AuthError::InvalidResetToken))?;

        let issued_at =
            from_base36(ts_part).ok_or(AppError::Auth(AuthError::InvalidResetToken))?;

        let submitted =
            hex::decode(sig_part).map_err(|_| AppError::Auth(AuthError::InvalidResetToken))?;

        // Constant-time comparison via the Mac implementation
        let mut mac = self.keyed_mac()?;
        mac.update(self.message(user_id, password_hash, issued_at).as_bytes());
        mac.verify_slice(&submitted)
            .map_err(|_| AppError::Auth(AuthError::InvalidResetToken))?;

        let age = Utc::now().timestamp() - issued_at;
        if age > self.timeout_seconds {
            tracing::info!(user_id = %user_id, "Expired password reset token");
            return Err(AppError::Auth(AuthError::InvalidResetToken));
        }

        Ok(())
    }

    fn signature(
        &self,
        user_id: &Uuid,
        password_hash: &str,
        issued_at: i64,
    ) -> Result<Vec<u8>, AppError> {
        let mut mac = self.keyed_mac()?;
        mac.update(self.message(user_id, password_hash, issued_at).as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn message(&self, user_id: &Uuid, password_hash: &str, issued_at: i64) -> String {
        format!("{}:{}:{}", user_id, password_hash, issued_at)
    }

    fn keyed_mac(&self) -> Result<HmacSha256, AppError> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AppError::Internal(format!("Failed to key reset token HMAC: {}", e)))
    }
}

/// Encode a user id into the opaque, reversible uid fragment
pub fn encode_uid(user_id: &Uuid) -> String {
    URL_SAFE_NO_PAD.encode(user_id.to_string().as_bytes())
}

/// Decode a uid fragment back into a user id
///
/// # Errors
/// Returns `InvalidUser` for anything that does not decode to a UUID
pub fn decode_uid(uid: &str) -> Result<Uuid, AppError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(uid.as_bytes())
        .map_err(|_| AppError::Auth(AuthError::InvalidUser))?;
    let decoded =
        String::from_utf8(bytes).map_err(|_| AppError::Auth(AuthError::InvalidUser))?;
    Uuid::parse_str(&decoded).map_err(|_| AppError::Auth(AuthError::InvalidUser))
}

fn to_base36(mut n: i64) -> String {
    const DIGITS: &[char] = &[
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h',
        'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    ];

    if n <= 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        digits.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.iter().rev().collect()
}

fn from_base36(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    let mut n: i64 = 0;
    for c in s.chars() {
        let digit = c.to_digit(36)? as i64;
        n = n.checked_mul(36)?.checked_add(digit)?;
    }
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> ResetTokenGenerator {
        ResetTokenGenerator::new("reset-secret-for-tests", DEFAULT_RESET_TIMEOUT_SECONDS)
    }

    #[test]
    fn test_base36_round_trip() {
        for n in [0, 1, 35, 36, 1234567890, 1_700_000_000] {
            assert_eq!(from_base36(&to_base36(n)), Some(n));
        }
        assert_eq!(from_base36(""), None);
        assert_eq!(from_base36("not base36!"), None);
    }

    #[test]
    fn test_uid_round_trip() {
        let user_id = Uuid::new_v4();
        let uid = encode_uid(&user_id);

        // Opaque: the fragment is not the raw UUID string
        assert_ne!(uid, user_id.to_string());
        assert_eq!(decode_uid(&uid).unwrap(), user_id);
    }

    #[test]
    fn test_decode_uid_rejects_garbage() {
        assert!(decode_uid("%%%not-base64%%%").is_err());
        assert!(decode_uid(&URL_SAFE_NO_PAD.encode(b"not-a-uuid")).is_err());
    }

    #[test]
    fn test_token_validates_against_current_hash() {
        let gen = generator();
        let user_id = Uuid::new_v4();
        let hash = "$2b$12$abcdefghijklmnopqrstuv";

        let token = gen.make_token(&user_id, hash).expect("Failed to make token");
        assert!(gen.check_token(&user_id, hash, &token).is_ok());
    }

    #[test]
    fn test_token_invalidated_by_hash_change() {
        let gen = generator();
        let user_id = Uuid::new_v4();

        let token = gen
            .make_token(&user_id, "$2b$12$old-hash")
            .expect("Failed to make token");
        assert!(gen.check_token(&user_id, "$2b$12$new-hash", &token).is_err());
    }

    #[test]
    fn test_token_bound_to_user() {
        let gen = generator();
        let hash = "$2b$12$abcdefghijklmnopqrstuv";

        let token = gen
            .make_token(&Uuid::new_v4(), hash)
            .expect("Failed to make token");
        assert!(gen.check_token(&Uuid::new_v4(), hash, &token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let gen = generator();
        let user_id = Uuid::new_v4();
        let hash = "$2b$12$abcdefghijklmnopqrstuv";

        let token = gen.make_token(&user_id, hash).expect("Failed to make token");

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('0');
        assert!(gen.check_token(&user_id, hash, &tampered).is_err());

        assert!(gen.check_token(&user_id, hash, "no-delimiter").is_err());
        assert!(gen.check_token(&user_id, hash, "").is_err());
    }

    #[test]
    fn test_token_expires_after_window() {
        let gen = generator();
        let user_id = Uuid::new_v4();
        let hash = "$2b$12$abcdefghijklmnopqrstuv";

        let issued_at = Utc::now().timestamp() - DEFAULT_RESET_TIMEOUT_SECONDS - 10;
        let token = gen
            .make_token_at(&user_id, hash, issued_at)
            .expect("Failed to make token");
        assert!(gen.check_token(&user_id, hash, &token).is_err());
    }

    #[test]
    fn test_token_valid_within_window() {
        let gen = generator();
        let user_id = Uuid::new_v4();
        let hash = "$2b$12$abcdefghijklmnopqrstuv";

        let issued_at = Utc::now().timestamp() - DEFAULT_RESET_TIMEOUT_SECONDS + 60;
        let token = gen
            .make_token_at(&user_id, hash, issued_at)
            .expect("Failed to make token");
        assert!(gen.check_token(&user_id, hash, &token).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let user_id = Uuid::new_v4();
        let hash = "$2b$12$abcdefghijklmnopqrstuv";

        let token = generator()
            .make_token(&user_id, hash)
            .expect("Failed to make token");

        let other = ResetTokenGenerator::new("another-secret", DEFAULT_RESET_TIMEOUT_SECONDS);
        assert!(other.check_token(&user_id, hash, &token).is_err());
    }
}
