/// Authentication Routes
///
/// Handles user registration, login, and token refresh.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{hash_password, issue_token_pair, verify_password, Role};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::request_logging::{AuditLog, AuditLogger};
use crate::validators::{is_valid_email, is_valid_username};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Token pair response returned by login and refresh
#[derive(Serialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Public user representation (password never echoed)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
}

/// POST /register/
///
/// Register a new user with username, email, password, and role.
///
/// # Validation
/// - Username restricted to letters, digits and @ . + - _ and unique
/// - Email must be valid format and unique
/// - Password must be 8+ chars with digit, lowercase, and uppercase
/// - Role must be one of admin / instructor / student
///
/// # Errors
/// - 400: Validation errors, including duplicate username/email per field
/// - 500: Internal server error
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    // Validate inputs
    let username = is_valid_username(&form.username)?;
    let email = is_valid_email(&form.email)?;
    let role = Role::parse(&form.role)?;
    let password_hash = hash_password(&form.password)?;

    // Create user in database
    let user_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(user_id)
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .bind(role.as_str())
    .bind(Utc::now())
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    AuditLogger::log(
        &AuditLog::new(
            "REGISTER_USER".to_string(),
            "user".to_string(),
            "SUCCESS".to_string(),
            "User registered".to_string(),
        )
        .with_resource_id(user_id.to_string()),
    );

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        role = %role,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse {
        id: user_id.to_string(),
        username,
        email,
        role: role.as_str().to_string(),
    }))
}

/// POST /login/
///
/// Authenticate user with username and password.
/// Returns access and refresh tokens on success.
///
/// # Errors
/// - 400: Validation error (missing fields)
/// - 401: Invalid credentials (username not found or wrong password)
/// - 500: Internal server error
///
/// # Security Notes
/// - Uses the same error for "not found" and "wrong password"
/// - Prevents user enumeration attacks
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    // Fetch user from database
    let user = sqlx::query_as::<_, (Uuid, String, String)>(
        "SELECT id, password_hash, role FROM users WHERE username = $1",
    )
    .bind(&form.username)
    .fetch_optional(pool.get_ref())
    .await?;

    let (user_id, password_hash, role) = match user {
        Some(row) => row,
        None => {
            AuditLogger::log(&AuditLog::new(
                "LOGIN".to_string(),
                "user".to_string(),
                "FAILURE".to_string(),
                "Invalid credentials".to_string(),
            ));
            return Err(AppError::Auth(AuthError::InvalidCredentials));
        }
    };

    // Verify password
    let password_valid = verify_password(&form.password, &password_hash)?;
    if !password_valid {
        AuditLogger::log(
            &AuditLog::new(
                "LOGIN".to_string(),
                "user".to_string(),
                "FAILURE".to_string(),
                "Invalid credentials".to_string(),
            )
            .with_resource_id(user_id.to_string()),
        );
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let role = Role::parse(&role)?;

    // Generate token pair
    let pair = issue_token_pair(&user_id, role, jwt_config.get_ref())?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
    }))
}

/// POST /token/refresh/
///
/// Mint a new token pair from a valid refresh token.
///
/// # Errors
/// - 400: Validation error (missing field)
/// - 401: Invalid, expired, or wrong-type token
/// - 500: Internal server error
pub async fn refresh_token(
    form: web::Json<RefreshRequest>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let claims = crate::auth::validate_refresh_token(&form.refresh, jwt_config.get_ref())?;
    let user_id = claims.user_id()?;
    let role = claims.role()?;

    let pair = issue_token_pair(&user_id, role, jwt_config.get_ref())?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "Token refreshed successfully"
    );

    Ok(HttpResponse::Ok().json(TokenPairResponse {
        access: pair.access,
        refresh: pair.refresh,
    }))
}
