use std::path::{Path, PathBuf};
use std::process::ExitCode;

use foodgram::{
    connect_and_migrate,
    db::{ImportReport, RowOutcome, import_ingredients_from_path},
    env::{AppConfig, load_environment},
    error::AppError,
    telemetry::init_tracing,
};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = load_environment() {
        eprintln!("Failed to load environment: {}", err);
        return ExitCode::FAILURE;
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_tracing(&config);

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.ingredients_csv.clone());

    match run(&config, &path).await {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "Ingredient import failed");
            eprintln!("Import of {} failed: {}", path.display(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &AppConfig, path: &Path) -> Result<ImportReport, AppError> {
    let pool = connect_and_migrate(&config.database_url).await?;
    let report = import_ingredients_from_path(&pool, path).await?;
    pool.close().await;

    Ok(report)
}

fn print_report(report: &ImportReport) {
    for row in &report.rows {
        let name = row.name.as_deref().unwrap_or("-");
        let unit = row.measurement_unit.as_deref().unwrap_or("-");

        let status = match &row.outcome {
            RowOutcome::Imported => "imported".to_string(),
            RowOutcome::AlreadyExists => "skipped, already exists".to_string(),
            RowOutcome::NameTakenWithOtherUnit { existing_unit } => {
                format!("skipped, name already used with unit {}", existing_unit)
            }
            RowOutcome::DuplicateInFile => "skipped, repeated in file".to_string(),
            RowOutcome::Malformed(reason) => format!("malformed, {}", reason),
        };

        println!("    line {}: {} ({}) {}", row.line, name, unit, status);
    }

    println!(
        "Imported {}, skipped {}, malformed {}",
        report.imported(),
        report.skipped(),
        report.malformed()
    );
}
