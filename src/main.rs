use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;

use openlms::configuration::get_configuration;
use openlms::email_client::{EmailClient, SenderEmail};
use openlms::startup::run;
use openlms::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize structured logging
    init_telemetry();

    tracing::info!("Starting application");

    // Load configuration
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // Create database connection pool
    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    // Outbound email client
    let sender = SenderEmail::parse(configuration.email.sender.clone()).map_err(|e| {
        tracing::error!("Invalid sender address in configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;
    let email_client = EmailClient::new(
        configuration.email.base_url.clone(),
        sender,
        reqwest::Client::new(),
    );

    // Bind server address
    let address = format!("127.0.0.1:{}", configuration.application.port);
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(
        listener,
        pool,
        configuration.jwt.clone(),
        configuration.password_reset.clone(),
        email_client,
    )?;
    tracing::info!("Server started successfully");

    let _ = server.await;

    Ok(())
}
