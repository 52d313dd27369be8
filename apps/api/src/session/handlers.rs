use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::document::{ItemId, PendingPhoto};
use crate::editor::{EditorView, FieldEdit, SectionKind};
use crate::errors::AppError;
use crate::preview::render_markdown;
use crate::reorder::ReorderRequest;
use crate::session::{EditResponse, SaveReceipt, SessionView};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct OpenSessionRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub resume_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub description: String,
}

#[derive(Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub format: Option<String>,
}

fn section(raw: &str) -> Result<SectionKind, AppError> {
    Ok(raw.parse::<SectionKind>()?)
}

/// POST /api/v1/sessions
pub async fn handle_open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let session = state
        .sessions
        .open(&state.services, req.user_id, req.resume_id)
        .await?;
    Ok((StatusCode::CREATED, Json(session.view())))
}

/// GET /api/v1/sessions/:sid
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.get(sid)?.view()))
}

/// DELETE /api/v1/sessions/:sid
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.close(sid)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:sid/steps/:key
pub async fn handle_go_to_step(
    State(state): State<AppState>,
    Path((sid, key)): Path<(Uuid, String)>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.get(sid)?.go_to_step(&key)?))
}

/// GET /api/v1/sessions/:sid/sections/:section
pub async fn handle_get_section(
    State(state): State<AppState>,
    Path((sid, raw)): Path<(Uuid, String)>,
) -> Result<Json<EditorView>, AppError> {
    let kind = section(&raw)?;
    Ok(Json(state.sessions.get(sid)?.editor_view(kind)))
}

/// PATCH /api/v1/sessions/:sid/sections/:section/fields
pub async fn handle_set_field(
    State(state): State<AppState>,
    Path((sid, raw)): Path<(Uuid, String)>,
    Json(edit): Json<FieldEdit>,
) -> Result<Json<EditResponse>, AppError> {
    let kind = section(&raw)?;
    Ok(Json(state.sessions.get(sid)?.set_field(kind, edit)?))
}

/// POST /api/v1/sessions/:sid/sections/:section/items
pub async fn handle_append_item(
    State(state): State<AppState>,
    Path((sid, raw)): Path<(Uuid, String)>,
) -> Result<(StatusCode, Json<EditResponse>), AppError> {
    let kind = section(&raw)?;
    let response = state.sessions.get(sid)?.append_item(kind)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// PATCH /api/v1/sessions/:sid/sections/:section/items/:id
pub async fn handle_set_item_field(
    State(state): State<AppState>,
    Path((sid, raw, id)): Path<(Uuid, String, u64)>,
    Json(edit): Json<FieldEdit>,
) -> Result<Json<EditResponse>, AppError> {
    let kind = section(&raw)?;
    Ok(Json(
        state
            .sessions
            .get(sid)?
            .set_item_field(kind, ItemId::from(id), edit)?,
    ))
}

/// DELETE /api/v1/sessions/:sid/sections/:section/items/:id
pub async fn handle_remove_item(
    State(state): State<AppState>,
    Path((sid, raw, id)): Path<(Uuid, String, u64)>,
) -> Result<Json<EditResponse>, AppError> {
    let kind = section(&raw)?;
    Ok(Json(
        state.sessions.get(sid)?.remove_item(kind, ItemId::from(id))?,
    ))
}

/// POST /api/v1/sessions/:sid/sections/:section/reorder
pub async fn handle_reorder(
    State(state): State<AppState>,
    Path((sid, raw)): Path<(Uuid, String)>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<EditResponse>, AppError> {
    let kind = section(&raw)?;
    Ok(Json(state.sessions.get(sid)?.reorder(kind, request)?))
}

/// PUT /api/v1/sessions/:sid/photo
/// Expects a multipart body with a `photo` file field.
pub async fn handle_set_photo(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.sessions.get(sid)?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("photo") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("photo").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;
        let photo = PendingPhoto::new(file_name, content_type, bytes);
        return Ok(Json(session.set_photo(photo)?));
    }
    Err(AppError::Validation("Missing 'photo' file field".to_string()))
}

/// DELETE /api/v1/sessions/:sid/photo
pub async fn handle_remove_photo(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<EditResponse>, AppError> {
    Ok(Json(state.sessions.get(sid)?.remove_photo()?))
}

/// GET /api/v1/sessions/:sid/photo/:token
pub async fn handle_photo_preview(
    State(state): State<AppState>,
    Path((sid, token)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let photo = state
        .sessions
        .get(sid)?
        .photo_preview(token)
        .ok_or_else(|| AppError::NotFound(format!("Photo preview {token} not found")))?;
    Ok(([(header::CONTENT_TYPE, photo.content_type)], photo.bytes).into_response())
}

/// GET /api/v1/sessions/:sid/preview
/// `?format=markdown` returns the rendered markdown instead of the layout JSON.
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Query(query): Query<PreviewQuery>,
) -> Result<Response, AppError> {
    let preview = state.sessions.get(sid)?.preview();
    match query.format.as_deref() {
        Some("markdown") => Ok((
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            render_markdown(&preview.layout),
        )
            .into_response()),
        Some("json") | None => Ok(Json(preview).into_response()),
        Some(other) => Err(AppError::Validation(format!(
            "Unknown preview format '{other}'"
        ))),
    }
}

/// POST /api/v1/sessions/:sid/save
pub async fn handle_save(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<SaveReceipt>, AppError> {
    let session = state.sessions.get(sid)?;
    Ok(Json(session.save().await?))
}

/// POST /api/v1/sessions/:sid/generate/work-experience
pub async fn handle_generate_work_experience(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<EditResponse>), AppError> {
    let session = state.sessions.get(sid)?;
    let response = session.generate_work_experience(&req.description).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/sessions/:sid/generate/project
pub async fn handle_generate_project(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<EditResponse>), AppError> {
    let session = state.sessions.get(sid)?;
    let response = session.generate_project(&req.description).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/sessions/:sid/generate/summary
pub async fn handle_generate_summary(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<EditResponse>, AppError> {
    let session = state.sessions.get(sid)?;
    Ok(Json(session.generate_summary().await?))
}
