/// Password Reset Routes
///
/// The forgot-password flow issues a token bound to the user's current
/// password hash and mails a reset link. The reset flow validates the uid
/// and token, then stores the new hash, which invalidates every token
/// issued before the change.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{decode_uid, encode_uid, hash_password, ResetTokenGenerator};
use crate::configuration::PasswordResetSettings;
use crate::email_client::EmailClient;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::request_logging::{AuditLog, AuditLogger};
use crate::validators::is_valid_email;

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub uid: String,
    pub token: String,
    pub new_password: String,
}

/// POST /forgot-password/
///
/// Always returns 200 with the same body whether or not the email is
/// registered, so the endpoint cannot be used to enumerate accounts.
/// Delivery failures are logged and swallowed: the issued token stays
/// valid even if the email never goes out.
///
/// # Errors
/// - 400: Malformed email
/// - 500: Internal server error
pub async fn forgot_password(
    form: web::Json<ForgotPasswordRequest>,
    pool: web::Data<PgPool>,
    reset_tokens: web::Data<ResetTokenGenerator>,
    reset_config: web::Data<PasswordResetSettings>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("password_reset_request");

    let email = is_valid_email(&form.email)?;

    let user = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, password_hash FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?;

    if let Some((user_id, password_hash)) = user {
        let uid = encode_uid(&user_id);
        let token = reset_tokens.make_token(&user_id, &password_hash)?;
        let reset_link = format!(
            "{}/reset-password/{}/{}/",
            reset_config.link_base_url, uid, token
        );

        let body = format!("Click the link to reset password: {}", reset_link);
        if let Err(e) = email_client
            .send_email(&email, "Password Reset", &body)
            .await
        {
            // Best-effort delivery: the token stays valid regardless
            tracing::warn!(
                request_id = %context.request_id,
                user_id = %user_id,
                error = %e,
                "Failed to deliver password reset email"
            );
        }

        AuditLogger::log(
            &AuditLog::new(
                "PASSWORD_RESET_REQUEST".to_string(),
                "user".to_string(),
                "SUCCESS".to_string(),
                "Password reset link issued".to_string(),
            )
            .with_resource_id(user_id.to_string()),
        );
    }

    // Identical response for known and unknown emails
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password reset link sent to email"
    })))
}

/// POST /reset-password/
///
/// Consume a reset token and store the new password. Token validation is
/// performed against the *current* stored hash, so a token is single-use:
/// the successful reset re-hashes the password and thereby invalidates
/// itself and all sibling tokens.
///
/// # Errors
/// - 400: Unknown user, invalid/expired token, or weak new password
/// - 500: Internal server error
pub async fn reset_password(
    form: web::Json<ResetPasswordRequest>,
    pool: web::Data<PgPool>,
    reset_tokens: web::Data<ResetTokenGenerator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("password_reset_consume");

    let user_id = decode_uid(&form.uid)?;

    let user = sqlx::query_as::<_, (String,)>(
        "SELECT password_hash FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await?;

    let (password_hash,) = user.ok_or(AppError::Auth(AuthError::InvalidUser))?;

    if let Err(e) = reset_tokens.check_token(&user_id, &password_hash, &form.token) {
        AuditLogger::log(
            &AuditLog::new(
                "PASSWORD_RESET_CONSUME".to_string(),
                "user".to_string(),
                "FAILURE".to_string(),
                "Invalid or expired reset token".to_string(),
            )
            .with_resource_id(user_id.to_string()),
        );
        return Err(e);
    }

    let new_hash = hash_password(&form.new_password)?;

    sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $1, updated_at = $2
        WHERE id = $3
        "#,
    )
    .bind(&new_hash)
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool.get_ref())
    .await?;

    AuditLogger::log(
        &AuditLog::new(
            "PASSWORD_RESET_CONSUME".to_string(),
            "user".to_string(),
            "SUCCESS".to_string(),
            "Password reset".to_string(),
        )
        .with_resource_id(user_id.to_string()),
    );

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "Password reset successfully"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password reset successful"
    })))
}
