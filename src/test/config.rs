#[cfg(test)]
mod tests {
    use serial_test::serial;
    use std::path::PathBuf;

    use crate::env::{
        AppConfig, ConfigError, DEFAULT_INGREDIENTS_CSV, DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE,
        DEFAULT_USERS_PAGE_SIZE,
    };

    const VARS: [&str; 7] = [
        "DATABASE_URL",
        "PAGE_SIZE",
        "MAX_PAGE_SIZE",
        "USERS_PAGE_SIZE",
        "INGREDIENTS_CSV",
        "OTEL_EXPORTER_OTLP_ENDPOINT",
        "OTEL_API_KEY",
    ];

    fn with_env<R>(overrides: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let vars: Vec<(&str, Option<&str>)> = VARS
            .iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| *value);
                (*name, value)
            })
            .collect();

        temp_env::with_vars(vars, f)
    }

    #[test]
    #[serial]
    fn test_defaults_apply() {
        let config = with_env(&[("DATABASE_URL", "sqlite://test.db")], AppConfig::from_env)
            .unwrap();

        assert_eq!(config.database_url, "sqlite://test.db");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.max_page_size, DEFAULT_MAX_PAGE_SIZE);
        assert_eq!(config.users_page_size, DEFAULT_USERS_PAGE_SIZE);
        assert_eq!(config.ingredients_csv, PathBuf::from(DEFAULT_INGREDIENTS_CSV));
        assert!(config.otlp_endpoint.is_none());
        assert!(config.otlp_api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_overrides_are_read() {
        let config = with_env(
            &[
                ("DATABASE_URL", "sqlite::memory:"),
                ("PAGE_SIZE", "12"),
                ("USERS_PAGE_SIZE", " 4 "),
                ("INGREDIENTS_CSV", "/tmp/catalog.csv"),
                ("OTEL_EXPORTER_OTLP_ENDPOINT", "https://collector:4317"),
                ("OTEL_API_KEY", ""),
            ],
            AppConfig::from_env,
        )
        .unwrap();

        assert_eq!(config.page_size, 12);
        assert_eq!(config.users_page_size, 4);
        assert_eq!(config.ingredients_csv, PathBuf::from("/tmp/catalog.csv"));
        assert_eq!(
            config.otlp_endpoint.as_deref(),
            Some("https://collector:4317")
        );
        assert!(config.otlp_api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_missing_database_url() {
        let result = with_env(&[], AppConfig::from_env);
        assert!(matches!(result, Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    #[serial]
    fn test_page_size_must_be_positive() {
        for bad in ["0", "-3", "six"] {
            let result = with_env(
                &[("DATABASE_URL", "sqlite::memory:"), ("PAGE_SIZE", bad)],
                AppConfig::from_env,
            );

            match result {
                Err(ConfigError::InvalidNumber { name, value }) => {
                    assert_eq!(name, "PAGE_SIZE");
                    assert_eq!(value, bad);
                }
                other => panic!("Expected InvalidNumber for {:?}, got {:?}", bad, other),
            }
        }
    }
}
