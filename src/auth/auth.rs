use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::db::get_user_by_token;

use super::User;

pub const TOKEN_SCHEME: &str = "Token";

/// Pulls the key out of an `Authorization: Token <key>` header.
pub fn parse_token_header(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    let key = key.trim();

    if scheme.eq_ignore_ascii_case(TOKEN_SCHEME) && !key.is_empty() {
        Some(key)
    } else {
        None
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("user_auth_guard");
        let _guard = auth_span.enter();

        let Some(header) = request.headers().get_one("Authorization") else {
            return Outcome::Error((Status::Unauthorized, ()));
        };

        let Some(token) = parse_token_header(header) else {
            tracing::warn!("Malformed authorization header");
            return Outcome::Error((Status::Unauthorized, ()));
        };

        let db = match request.rocket().state::<SqlitePool>() {
            Some(pool) => pool,
            _ => {
                tracing::error!("Database pool not found in managed state");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        match get_user_by_token(db, token).await {
            Ok(user) => {
                tracing::info!(username = %user.username, role = %user.role.as_str(), "User authenticated via token");
                Outcome::Success(user)
            }
            Err(err) => {
                tracing::warn!(error = ?err, "Invalid auth token");
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

#[catch(401)]
pub fn unauthorized_api(_req: &Request) -> Custom<Json<Value>> {
    let error_json = json!({
        "detail": "Authentication credentials were not provided"
    });

    Custom(Status::Unauthorized, Json(error_json))
}

#[catch(403)]
pub fn forbidden_api(_req: &Request) -> Custom<Json<Value>> {
    tracing::warn!("Forbidden access attempt");

    Custom(
        Status::Forbidden,
        Json(json!({ "detail": "You don't have permission to perform this action" })),
    )
}

#[catch(404)]
pub fn not_found_api(_req: &Request) -> Custom<Json<Value>> {
    Custom(Status::NotFound, Json(json!({ "detail": "Not found" })))
}
