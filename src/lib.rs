#[macro_use]
extern crate rocket;

pub mod api;
pub mod auth;
pub mod db;
pub mod env;
pub mod error;
pub mod models;
pub mod pagination;
pub mod telemetry;
pub mod validation;
#[cfg(test)]
mod test;

use rocket::{Build, Rocket};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use std::str::FromStr;
use tracing::info;

use auth::{forbidden_api, not_found_api, unauthorized_api};
use env::AppConfig;
use error::AppError;
use telemetry::TelemetryFairing;

/// Opens the database named by `database_url` and brings its schema up to date.
pub async fn connect_and_migrate(database_url: &str) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(options).await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed successfully");

    Ok(pool)
}

pub async fn init_rocket(pool: SqlitePool, config: AppConfig) -> Rocket<Build> {
    info!("Starting foodgram");

    rocket::build()
        .manage(pool)
        .manage(config)
        .mount("/api", api::routes())
        .mount("/", routes![api::recipes::follow_short_link])
        .register(
            "/api",
            catchers![unauthorized_api, forbidden_api, not_found_api],
        )
        .attach(TelemetryFairing)
}
