use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{StatusCode, header::CACHE_CONTROL},
    response::IntoResponse,
};
use serde_json::Value;

use crate::{
    AppState,
    error::{AppError, FieldError},
    utils::SEARCH_CACHE_CONTROL,
};

use super::model::ValidatedSearchQuery;

/// `POST /search`. Rate limiting has already happened in middleware.
#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = body.map_err(body_rejection)?;
    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        AppError::Validation(vec![FieldError::new(
            "body",
            "invalid_json",
            format!("request body is not valid JSON: {e}"),
        )])
    })?;

    let query = ValidatedSearchQuery::validate(&body)?;
    tracing::info!(query = %query.query, limit = query.limit, "search request");

    let data = state.upstream.search(&query).await?;

    Ok(([(CACHE_CONTROL, SEARCH_CACHE_CONTROL)], Json(data)))
}

fn body_rejection(rejection: BytesRejection) -> AppError {
    let code = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        "too_big"
    } else {
        "invalid_body"
    };
    AppError::Validation(vec![FieldError::new("body", code, rejection.body_text())])
}
