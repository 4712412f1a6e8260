/// Category and Course Routes
///
/// Listing is open to any authenticated user; creation is role-gated
/// through the access control guard (categories: admin, courses:
/// instructor). The course instructor is always the authenticated caller,
/// never taken from the request body.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{authorize, Claims, Operation};
use crate::error::{AppError, ValidationError};

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub category: Uuid,
}

#[derive(Serialize)]
pub struct CourseResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub instructor: String,
}

/// POST /categories/create/ (admin only)
pub async fn create_category(
    form: web::Json<CreateCategoryRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let claims = claims.into_inner();
    authorize(Some(&claims), Operation::CreateCategory)?;

    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "name".to_string(),
        )));
    }

    let category_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO categories (id, name, created_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(category_id)
    .bind(name)
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(category_id = %category_id, "Category created");

    Ok(HttpResponse::Created().json(CategoryResponse {
        id: category_id.to_string(),
        name: name.to_string(),
    }))
}

/// GET /categories/ (any authenticated user)
pub async fn list_categories(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let claims = claims.into_inner();
    authorize(Some(&claims), Operation::ListCategories)?;

    let rows = sqlx::query_as::<_, (Uuid, String)>(
        "SELECT id, name FROM categories ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await?;

    let categories: Vec<CategoryResponse> = rows
        .into_iter()
        .map(|(id, name)| CategoryResponse {
            id: id.to_string(),
            name,
        })
        .collect();

    Ok(HttpResponse::Ok().json(categories))
}

/// POST /courses/create/ (instructor only)
///
/// The instructor is the authenticated caller.
pub async fn create_course(
    form: web::Json<CreateCourseRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let claims = claims.into_inner();
    authorize(Some(&claims), Operation::CreateCourse)?;
    let instructor_id = claims.user_id()?;

    let title = form.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "title".to_string(),
        )));
    }

    let category_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)",
    )
    .bind(form.category)
    .fetch_one(pool.get_ref())
    .await?;

    if !category_exists {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "category".to_string(),
        )));
    }

    let course_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO courses (id, title, description, category_id, instructor_id, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(&form.description)
    .bind(form.category)
    .bind(instructor_id)
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    tracing::info!(
        course_id = %course_id,
        instructor_id = %instructor_id,
        "Course created"
    );

    Ok(HttpResponse::Created().json(CourseResponse {
        id: course_id.to_string(),
        title: title.to_string(),
        description: form.description.clone(),
        category: form.category.to_string(),
        instructor: instructor_id.to_string(),
    }))
}

/// GET /courses/ (any authenticated user)
pub async fn list_courses(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let claims = claims.into_inner();
    authorize(Some(&claims), Operation::ListCourses)?;

    let rows = sqlx::query_as::<_, (Uuid, String, String, Uuid, Uuid)>(
        "SELECT id, title, description, category_id, instructor_id FROM courses ORDER BY title",
    )
    .fetch_all(pool.get_ref())
    .await?;

    let courses: Vec<CourseResponse> = rows
        .into_iter()
        .map(
            |(id, title, description, category_id, instructor_id)| CourseResponse {
                id: id.to_string(),
                title,
                description,
                category: category_id.to_string(),
                instructor: instructor_id.to_string(),
            },
        )
        .collect();

    Ok(HttpResponse::Ok().json(courses))
}
