use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    http::header::CACHE_CONTROL,
    response::IntoResponse,
};

use crate::{AppState, error::AppError, utils::BUSINESS_CACHE_CONTROL};

use super::model::{BusinessDetail, validate_business_id};

/// `GET /business/{id}`.
///
/// The provider has no single-business endpoint wired up yet, so this serves
/// a sample record for any well-formed id once credentials are configured.
#[axum::debug_handler]
pub async fn get_business(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = path.map_err(|rejection| {
        tracing::debug!(%rejection, "undecodable business id");
        AppError::InvalidBusinessId
    })?;
    let id = validate_business_id(&id)?;
    state.config.upstream_credentials()?;

    Ok((
        [(CACHE_CONTROL, BUSINESS_CACHE_CONTROL)],
        Json(BusinessDetail::sample(id)),
    ))
}
