/// Dashboard Route
///
/// Aggregated platform counts for any authenticated user.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use sqlx::PgPool;

use crate::auth::{authorize, Claims, Operation, Role};
use crate::error::AppError;

#[derive(Serialize)]
pub struct RoleWiseUsers {
    pub admin: i64,
    pub instructor: i64,
    pub student: i64,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub total_users: i64,
    pub total_courses: i64,
    pub total_enrollments: i64,
    pub role_wise_users: RoleWiseUsers,
}

/// GET /dashboard/ (any authenticated user)
pub async fn dashboard(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let claims = claims.into_inner();
    authorize(Some(&claims), Operation::ViewDashboard)?;

    let total_users = count(&pool, "SELECT COUNT(*) FROM users").await?;
    let total_courses = count(&pool, "SELECT COUNT(*) FROM courses").await?;
    let total_enrollments = count(&pool, "SELECT COUNT(*) FROM enrollments").await?;

    let mut by_role = [0i64; 3];
    for (slot, role) in by_role
        .iter_mut()
        .zip([Role::Admin, Role::Instructor, Role::Student])
    {
        *slot = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(pool.get_ref())
            .await?;
    }

    Ok(HttpResponse::Ok().json(DashboardResponse {
        total_users,
        total_courses,
        total_enrollments,
        role_wise_users: RoleWiseUsers {
            admin: by_role[0],
            instructor: by_role[1],
            student: by_role[2],
        },
    }))
}

async fn count(pool: &web::Data<PgPool>, query: &str) -> Result<i64, AppError> {
    let n = sqlx::query_scalar::<_, i64>(query)
        .fetch_one(pool.get_ref())
        .await?;
    Ok(n)
}
