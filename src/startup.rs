use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::auth::ResetTokenGenerator;
use crate::configuration::{JwtSettings, PasswordResetSettings};
use crate::email_client::EmailClient;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{
    create_category, create_course, dashboard, enroll, forgot_password, get_profile,
    health_check, list_categories, list_courses, login, refresh_token, register,
    reset_password, update_profile,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
    reset_config: PasswordResetSettings,
    email_client: EmailClient,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let jwt_config_data = web::Data::new(jwt_config.clone());
    // Token machinery is explicit state built once at startup
    let reset_tokens = web::Data::new(ResetTokenGenerator::new(
        reset_config.secret.clone(),
        reset_config.timeout_seconds,
    ));
    let reset_config_data = web::Data::new(reset_config);
    let email_client_data = web::Data::new(email_client);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())      // Standard logging
            .wrap(LoggerMiddleware)       // Custom logging

            // Shared state
            .app_data(connection.clone())
            .app_data(jwt_config_data.clone())
            .app_data(reset_tokens.clone())
            .app_data(reset_config_data.clone())
            .app_data(email_client_data.clone())

            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .route("/register/", web::post().to(register))
            .route("/login/", web::post().to(login))
            .route("/token/refresh/", web::post().to(refresh_token))
            .route("/forgot-password/", web::post().to(forgot_password))
            .route("/reset-password/", web::post().to(reset_password))

            // Protected routes (require JWT authentication)
            .service(
                web::scope("")
                    .wrap(JwtMiddleware::new(jwt_config.clone()))
                    .route("/profile/", web::get().to(get_profile))
                    .route("/profile/", web::put().to(update_profile))
                    .route("/categories/", web::get().to(list_categories))
                    .route("/categories/create/", web::post().to(create_category))
                    .route("/courses/", web::get().to(list_courses))
                    .route("/courses/create/", web::post().to(create_course))
                    .route("/enroll/", web::post().to(enroll))
                    .route("/dashboard/", web::get().to(dashboard))
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
