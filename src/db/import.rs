use crate::error::AppError;
use serde::Serialize;
use sqlx::{Pool, QueryBuilder, Sqlite};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{error, info, instrument, warn};

// Three binds per row keeps each statement well under SQLite's variable cap.
const INSERT_CHUNK: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RowOutcome {
    Imported,
    AlreadyExists,
    NameTakenWithOtherUnit { existing_unit: String },
    DuplicateInFile,
    Malformed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct RowReport {
    /// 1-based line number in the source file.
    pub line: u64,
    pub name: Option<String>,
    pub measurement_unit: Option<String>,
    pub outcome: RowOutcome,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportReport {
    pub rows: Vec<RowReport>,
}

impl ImportReport {
    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn imported(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Imported))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                RowOutcome::AlreadyExists
                    | RowOutcome::NameTakenWithOtherUnit { .. }
                    | RowOutcome::DuplicateInFile
            )
        })
    }

    pub fn malformed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Malformed(_)))
    }
}

/// Reads `name,measurement_unit` rows and inserts the ones that are new.
/// Existing ingredients are never touched.
#[instrument(skip(pool, reader))]
pub async fn import_ingredients<R: Read>(
    pool: &Pool<Sqlite>,
    reader: R,
) -> Result<ImportReport, AppError> {
    info!("Importing ingredients");

    let existing: HashMap<String, String> =
        sqlx::query_as::<_, (String, String)>("SELECT name, measurement_unit FROM ingredients")
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut report = ImportReport::default();
    let mut pending: Vec<(String, String)> = Vec::new();
    let mut seen: HashMap<String, String> = HashMap::new();

    for (index, record) in csv_reader.records().enumerate() {
        let line = index as u64 + 1;

        let record = match record {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or(line);
                error!(line, error = %err, "Unreadable CSV row");
                report.rows.push(RowReport {
                    line,
                    name: None,
                    measurement_unit: None,
                    outcome: RowOutcome::Malformed(err.to_string()),
                });
                continue;
            }
        };

        let fields: Vec<&str> = record.iter().collect();
        let (name, unit) = match fields.as_slice() {
            [name, unit] if !name.is_empty() && !unit.is_empty() => {
                (name.to_string(), unit.to_string())
            }
            _ => {
                error!(line, row = ?fields, "Row does not match name,measurement_unit");
                report.rows.push(RowReport {
                    line,
                    name: None,
                    measurement_unit: None,
                    outcome: RowOutcome::Malformed(format!(
                        "Expected 2 non-empty fields, got {:?}",
                        fields
                    )),
                });
                continue;
            }
        };

        let outcome = match existing.get(&name) {
            Some(existing_unit) if *existing_unit == unit => RowOutcome::AlreadyExists,
            Some(existing_unit) => RowOutcome::NameTakenWithOtherUnit {
                existing_unit: existing_unit.clone(),
            },
            None if seen.contains_key(&name) => RowOutcome::DuplicateInFile,
            None => {
                seen.insert(name.clone(), unit.clone());
                pending.push((name.clone(), unit.clone()));
                RowOutcome::Imported
            }
        };

        if outcome != RowOutcome::Imported {
            warn!(line, name = %name, unit = %unit, outcome = ?outcome, "Skipping ingredient");
        }

        report.rows.push(RowReport {
            line,
            name: Some(name),
            measurement_unit: Some(unit),
            outcome,
        });
    }

    if !pending.is_empty() {
        let mut tx = pool.begin().await?;

        for chunk in pending.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO ingredients (name, name_lower, measurement_unit) ");
            builder.push_values(chunk, |mut row, (name, unit)| {
                row.push_bind(name.clone())
                    .push_bind(name.to_lowercase())
                    .push_bind(unit.clone());
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
    }

    info!(
        imported = report.imported(),
        skipped = report.skipped(),
        malformed = report.malformed(),
        "Ingredient import finished"
    );

    Ok(report)
}

#[instrument(skip(pool))]
pub async fn import_ingredients_from_path(
    pool: &Pool<Sqlite>,
    path: &Path,
) -> Result<ImportReport, AppError> {
    let file = File::open(path).map_err(|err| {
        AppError::NotFound(format!("Cannot open {}: {}", path.display(), err))
    })?;

    import_ingredients(pool, file).await
}
