use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const DEFAULT_MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_USERS_PAGE_SIZE: i64 = 10;
pub const DEFAULT_INGREDIENTS_CSV: &str = "data/ingredients.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub page_size: i64,
    pub max_page_size: i64,
    pub users_page_size: i64,
    pub ingredients_csv: PathBuf,
    pub otlp_endpoint: Option<String>,
    pub otlp_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            dotenvy::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            page_size: positive_var("PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            max_page_size: positive_var("MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?,
            users_page_size: positive_var("USERS_PAGE_SIZE", DEFAULT_USERS_PAGE_SIZE)?,
            ingredients_csv: dotenvy::var("INGREDIENTS_CSV")
                .unwrap_or_else(|_| DEFAULT_INGREDIENTS_CSV.to_string())
                .into(),
            otlp_endpoint: optional_var("OTEL_EXPORTER_OTLP_ENDPOINT"),
            otlp_api_key: optional_var("OTEL_API_KEY"),
        })
    }

    /// Defaults for everything but the database location.
    pub fn with_database_url(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            users_page_size: DEFAULT_USERS_PAGE_SIZE,
            ingredients_csv: DEFAULT_INGREDIENTS_CSV.into(),
            otlp_endpoint: None,
            otlp_api_key: None,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    dotenvy::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn positive_var(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match dotenvy::var(name) {
        Ok(value) => match value.trim().parse::<i64>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(ConfigError::InvalidNumber { name, value }),
        },
        Err(_) => Ok(default),
    }
}

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}
