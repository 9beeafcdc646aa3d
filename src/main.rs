use foodgram::{
    connect_and_migrate,
    env::{AppConfig, ConfigError, load_environment},
    error::AppError,
    init_rocket,
    telemetry::{OtelGuard, init_tracing},
};
use once_cell::sync::OnceCell;
use rocket::{Build, Rocket};
use thiserror::Error;
use tracing::error;

// Lives for the whole process so batched spans are flushed on exit.
static TELEMETRY_GUARD: OnceCell<Option<OtelGuard>> = OnceCell::new();

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

async fn build() -> Result<Rocket<Build>, Error> {
    load_environment().map_err(|e| anyhow::anyhow!("Failed to load environment: {}", e))?;

    let config = AppConfig::from_env()?;
    let _ = TELEMETRY_GUARD.set(init_tracing(&config));

    let pool = connect_and_migrate(&config.database_url).await?;

    Ok(init_rocket(pool, config).await)
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let rocket = match build().await {
        Ok(rocket) => rocket,
        Err(err) => {
            error!(error = %err, "Failed to start foodgram");
            eprintln!("Failed to start foodgram: {}", err);
            return Err(err);
        }
    };

    if let Err(err) = rocket.launch().await {
        error!(error = %err, "Rocket stopped with an error");
        return Err(anyhow::anyhow!("Rocket failed: {}", err).into());
    }

    Ok(())
}
