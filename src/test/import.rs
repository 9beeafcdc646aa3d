#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::db::{RowOutcome, import_ingredients, import_ingredients_from_path, search_ingredients};
    use crate::error::AppError;
    use crate::test::utils::TestDbBuilder;

    #[rocket::async_test]
    async fn test_import_skips_existing_and_reports_rows() {
        let test_db = TestDbBuilder::new()
            .ingredient("flour", "g")
            .build()
            .await
            .unwrap();

        let csv = "flour,g\n\
                   salt,g\n\
                   salt,g\n\
                   flour,kg\n\
                   broken\n\
                   ,g\n\
                   pepper, g \n";

        let report = import_ingredients(&test_db.pool, csv.as_bytes())
            .await
            .unwrap();

        let outcomes: Vec<_> = report.rows.iter().map(|r| r.outcome.clone()).collect();
        assert_eq!(outcomes[0], RowOutcome::AlreadyExists);
        assert_eq!(outcomes[1], RowOutcome::Imported);
        assert_eq!(outcomes[2], RowOutcome::DuplicateInFile);
        assert_eq!(
            outcomes[3],
            RowOutcome::NameTakenWithOtherUnit {
                existing_unit: "g".to_string()
            }
        );
        assert!(matches!(outcomes[4], RowOutcome::Malformed(_)));
        assert!(matches!(outcomes[5], RowOutcome::Malformed(_)));
        assert_eq!(outcomes[6], RowOutcome::Imported);

        assert_eq!(report.rows[6].line, 7);
        assert_eq!(report.rows[6].measurement_unit.as_deref(), Some("g"));

        assert_eq!(report.imported(), 2);
        assert_eq!(report.skipped(), 3);
        assert_eq!(report.malformed(), 2);

        let names: Vec<_> = search_ingredients(&test_db.pool, None)
            .await
            .unwrap()
            .into_iter()
            .map(|i| (i.name, i.measurement_unit))
            .collect();
        assert_eq!(
            names,
            vec![
                ("flour".to_string(), "g".to_string()),
                ("pepper".to_string(), "g".to_string()),
                ("salt".to_string(), "g".to_string()),
            ]
        );
    }

    #[rocket::async_test]
    async fn test_reimport_changes_nothing() {
        let test_db = TestDbBuilder::new().build().await.unwrap();
        let csv = "мука,г\nмолоко,мл\n";

        let first = import_ingredients(&test_db.pool, csv.as_bytes())
            .await
            .unwrap();
        assert_eq!(first.imported(), 2);

        let second = import_ingredients(&test_db.pool, csv.as_bytes())
            .await
            .unwrap();
        assert_eq!(second.imported(), 0);
        assert_eq!(second.skipped(), 2);
        assert_eq!(test_db.count_rows("ingredients").await, 2);
    }

    #[rocket::async_test]
    async fn test_bundled_catalog_imports() {
        let test_db = TestDbBuilder::new().build().await.unwrap();

        let report = import_ingredients_from_path(&test_db.pool, Path::new("data/ingredients.csv"))
            .await
            .unwrap();

        assert!(report.imported() > 0);
        assert_eq!(report.malformed(), 0);
        assert_eq!(test_db.count_rows("ingredients").await, report.imported() as i64);
    }

    #[rocket::async_test]
    async fn test_missing_file_is_reported() {
        let test_db = TestDbBuilder::new().build().await.unwrap();

        let result =
            import_ingredients_from_path(&test_db.pool, Path::new("data/does-not-exist.csv")).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(test_db.count_rows("ingredients").await, 0);
    }
}
