use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::ResumeSummary;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    let resumes = state.services.store.list(params.user_id).await?;
    Ok(Json(resumes))
}

/// DELETE /api/v1/resumes/:id
/// Another user's resume is reported as not found.
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    let photo_url = state.services.store.delete(params.user_id, id).await?;
    if let Some(url) = photo_url {
        if let Err(e) = state.services.photos.delete(&url).await {
            warn!("Resume {id} deleted but its photo was not: {e}");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
