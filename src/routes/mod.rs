mod auth;
mod courses;
mod dashboard;
mod enrollments;
mod health_check;
mod password_reset;
mod profile;

pub use auth::{login, refresh_token, register};
pub use courses::{create_category, create_course, list_categories, list_courses};
pub use dashboard::dashboard;
pub use enrollments::enroll;
pub use health_check::health_check;
pub use password_reset::{forgot_password, reset_password};
pub use profile::{get_profile, update_profile};
