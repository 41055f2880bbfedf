//! Gatehouse API - AWS Lambda Runtime

use gatehouse_common::Config;
use gatehouse_email::{EmailConfig, EmailServiceFactory};
use lambda_http::{run, Error};
use sqlx::PgPool;
use tracing::info;

use gatehouse_app::{build_state, create_app, migrate};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .without_time()
        .init();

    info!("Initializing Gatehouse API Lambda");

    let config =
        Config::from_env().map_err(|e| Error::from(format!("Configuration error: {}", e)))?;

    let pool = PgPool::connect(&config.database_url)
        .await
        .map_err(|e| Error::from(format!("Database error: {}", e)))?;

    info!("Database connection established");

    migrate(&pool)
        .await
        .map_err(|e| Error::from(format!("Migration error: {}", e)))?;

    let email_config =
        EmailConfig::from_env().map_err(|e| Error::from(format!("Email config error: {}", e)))?;
    let email = EmailServiceFactory::create(email_config)
        .await
        .map_err(|e| Error::from(format!("Email service error: {}", e)))?;

    let app = create_app(&config, build_state(&config, pool, email));

    info!("Gatehouse API Lambda ready to serve requests");

    run(app).await
}
