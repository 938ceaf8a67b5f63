use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::str::FromStr;
use uuid::Uuid;

pub mod chat;
pub mod timetable;

const X_STUDENT_ID: &str = "X-Student-ID";

/// Identifies whose timetable a request works on. Not authentication: the
/// header is trusted as sent.
#[derive(Debug)]
pub struct ExtractStudent(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractStudent
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, (StatusCode, &'static str)> {
        let Some(student_id) = parts.headers.get(X_STUDENT_ID) else {
            return Err((StatusCode::BAD_REQUEST, "`X-Student-ID` header is missing"));
        };

        let student_id = student_id
            .to_str()
            .map_err(|_| (StatusCode::BAD_REQUEST, "invalid student id"))?;
        let student_id = Uuid::from_str(student_id.trim())
            .map_err(|_| (StatusCode::BAD_REQUEST, "invalid student id"))?;

        Ok(ExtractStudent(student_id))
    }
}

/// All routes, without the DI provider attached.
pub fn router() -> Router {
    Router::new()
        .route("/", get(health))
        .nest("/timetable", timetable::router())
        .nest("/chat", chat::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "Backend is running!" }))
}
