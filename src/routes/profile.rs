/// Profile Routes
///
/// Current-user profile retrieval and update.
/// **Requires a valid JWT access token**; claims are injected by the
/// JWT middleware.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{authorize, Claims, Operation, Role};
use crate::error::AppError;
use crate::validators::{is_valid_email, is_valid_username};

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
}

/// Partial profile update; absent fields are left unchanged
#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// GET /profile/
///
/// # Errors
/// - 401: Missing or invalid token (handled by middleware)
/// - 404: User not found (should not happen if token is valid)
pub async fn get_profile(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let claims = claims.into_inner();
    authorize(Some(&claims), Operation::ViewProfile)?;
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, (Uuid, String, String, String)>(
        "SELECT id, username, email, role FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        id: user.0.to_string(),
        username: user.1,
        email: user.2,
        role: user.3,
    }))
}

/// PUT /profile/
///
/// Update the current user's profile. A submitted `role` is applied only
/// when the caller is an admin; for everyone else the stored role is kept.
///
/// # Errors
/// - 400: Validation errors, including duplicate username/email per field
/// - 401: Missing or invalid token (handled by middleware)
pub async fn update_profile(
    form: web::Json<UpdateProfileRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let claims = claims.into_inner();
    authorize(Some(&claims), Operation::UpdateProfile)?;
    let user_id = claims.user_id()?;

    let current = sqlx::query_as::<_, (String, String, String)>(
        "SELECT username, email, role FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_one(pool.get_ref())
    .await?;

    let (current_username, current_email, current_role) = current;

    let username = match form.username.as_deref() {
        Some(submitted) => is_valid_username(submitted)?,
        None => current_username,
    };
    let email = match form.email.as_deref() {
        Some(submitted) => is_valid_email(submitted)?,
        None => current_email,
    };

    // Role is immutable except for admin callers
    let is_admin = claims.role()? == Role::Admin;
    let role = match form.role.as_deref() {
        Some(submitted) if is_admin => Role::parse(submitted)?.as_str().to_string(),
        _ => current_role,
    };

    sqlx::query(
        r#"
        UPDATE users
        SET username = $1, email = $2, role = $3, updated_at = $4
        WHERE id = $5
        "#,
    )
    .bind(&username)
    .bind(&email)
    .bind(&role)
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool.get_ref())
    .await?;

    tracing::info!(user_id = %user_id, "Profile updated");

    Ok(HttpResponse::Ok().json(ProfileResponse {
        id: user_id.to_string(),
        username,
        email,
        role,
    }))
}
