/// Enrollment Routes
///
/// Students enroll themselves into courses; the student is always the
/// authenticated caller.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{authorize, Claims, Operation};
use crate::error::{AppError, ValidationError};

#[derive(Deserialize)]
pub struct EnrollRequest {
    pub course: Uuid,
}

#[derive(Serialize)]
pub struct EnrollmentResponse {
    pub id: String,
    pub course: String,
    pub student: String,
}

/// POST /enroll/ (student only)
pub async fn enroll(
    form: web::Json<EnrollRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let claims = claims.into_inner();
    authorize(Some(&claims), Operation::CreateEnrollment)?;
    let student_id = claims.user_id()?;

    let course_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)",
    )
    .bind(form.course)
    .fetch_one(pool.get_ref())
    .await?;

    if !course_exists {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "course".to_string(),
        )));
    }

    let enrollment_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO enrollments (id, course_id, student_id, enrolled_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(enrollment_id)
    .bind(form.course)
    .bind(student_id)
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(
        enrollment_id = %enrollment_id,
        student_id = %student_id,
        course_id = %form.course,
        "Enrollment created"
    );

    Ok(HttpResponse::Created().json(EnrollmentResponse {
        id: enrollment_id.to_string(),
        course: form.course.to_string(),
        student: student_id.to_string(),
    }))
}
