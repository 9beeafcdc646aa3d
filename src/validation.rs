use crate::error::AppError;
use once_cell::sync::Lazy;
use regex::Regex;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use tracing::instrument;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

pub static SLUG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());

pub static IMAGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/=\s]+$").unwrap());

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ValidationResponse {
    pub status: String,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationResponse {
    pub fn new(errors: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            status: "error".to_string(),
            errors,
        }
    }

    pub fn with_error(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self::new(errors)
    }
}

pub type ApiResult<T> = Result<T, Custom<Json<ValidationResponse>>>;

pub trait ToValidationResponse {
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>>;
}

impl ToValidationResponse for AppError {
    #[instrument]
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>> {
        self.log_and_record("API Validation Error");
        let status = self.status_code();

        let (field, message) = match &self {
            AppError::Database(_) => ("server", "Internal server error".to_string()),
            AppError::Authentication(msg) => ("authentication", msg.clone()),
            AppError::Authorization(msg) => ("permission", msg.clone()),
            AppError::NotFound(msg) => ("detail", msg.clone()),
            AppError::Validation { field, message } => (field.as_str(), message.clone()),
            AppError::Conflict(msg) => ("detail", msg.clone()),
            AppError::Internal(_) => ("server", "Internal server error".to_string()),
        };

        Custom(status, Json(ValidationResponse::with_error(field, &message)))
    }
}

impl ToValidationResponse for Status {
    #[instrument]
    fn to_validation_response(self) -> Custom<Json<ValidationResponse>> {
        let (field, message) = match self.code {
            403 => (
                "permission",
                "You don't have permission to perform this action",
            ),
            401 => ("authentication", "Authentication required"),
            404 => ("detail", "Resource not found"),
            409 => ("detail", "Resource already exists"),
            400 => ("request", "Bad request"),
            500 => ("server", "Internal server error"),
            _ => ("error", "An error occurred"),
        };

        Custom(self, Json(ValidationResponse::with_error(field, message)))
    }
}

#[derive(Debug)]
pub struct ValidationErrorWrapper(pub ValidationErrors);

impl From<ValidationErrorWrapper> for Custom<Json<ValidationResponse>> {
    #[instrument]
    fn from(wrapper: ValidationErrorWrapper) -> Self {
        let mut error_map = BTreeMap::new();
        collect_errors(&wrapper.0, "", &mut error_map);

        tracing::warn!(errors = ?error_map, "Payload validation failed");

        Custom(Status::BadRequest, Json(ValidationResponse::new(error_map)))
    }
}

/// Flattens nested struct and list errors into dotted keys such as
/// `ingredients[1].amount`.
fn collect_errors(
    errors: &ValidationErrors,
    prefix: &str,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = out.entry(key).or_default();
                for error in field_errors {
                    messages.push(
                        error
                            .message
                            .clone()
                            .unwrap_or_else(|| "Invalid value".into())
                            .to_string(),
                    );
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_errors(inner, &key, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(inner, &format!("{}[{}]", key, index), out);
                }
            }
        }
    }
}

pub trait JsonValidateExt<T> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>>;
}

impl<T: Validate> JsonValidateExt<T> for Json<T> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>> {
        let inner = self.into_inner();
        inner
            .validate()
            .map_err(|errors| Custom::from(ValidationErrorWrapper(errors)))?;
        Ok(inner)
    }
}

pub trait AppErrorExt<T> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>>;
}

impl<T> AppErrorExt<T> for Result<T, AppError> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>> {
        self.map_err(|err| err.to_validation_response())
    }
}

impl<T> AppErrorExt<T> for Result<T, Status> {
    fn validate_custom(self) -> Result<T, Custom<Json<ValidationResponse>>> {
        self.map_err(|status| status.to_validation_response())
    }
}

/// Rejects sequences that mention the same key twice.
pub fn ensure_unique<T, K, F>(items: &[T], key: F) -> bool
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().all(|item| seen.insert(key(item)))
}

pub fn unique_tag_ids(tags: &[i64]) -> Result<(), ValidationError> {
    if ensure_unique(tags, |id| *id) {
        Ok(())
    } else {
        Err(ValidationError::new("unique").with_message("Tags must be unique".into()))
    }
}

pub fn encoded_image(image: &str) -> Result<(), ValidationError> {
    if IMAGE_REGEX.is_match(image) {
        Ok(())
    } else {
        Err(ValidationError::new("image")
            .with_message("Image must be a base64 encoded data URL".into()))
    }
}
