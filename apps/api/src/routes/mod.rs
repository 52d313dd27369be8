pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::session::handlers as sessions;
use crate::state::AppState;
use crate::storage::handlers as resumes;

pub fn build_router(state: AppState) -> Router {
    // Oversized photos still have to arrive so validation can report them.
    let body_limit = state.config.photo_max_bytes.saturating_mul(4);

    Router::new()
        .route("/health", get(health::health_handler))
        // Editing sessions
        .route("/api/v1/sessions", post(sessions::handle_open_session))
        .route(
            "/api/v1/sessions/:sid",
            get(sessions::handle_get_session).delete(sessions::handle_close_session),
        )
        .route(
            "/api/v1/sessions/:sid/steps/:key",
            post(sessions::handle_go_to_step),
        )
        .route(
            "/api/v1/sessions/:sid/sections/:section",
            get(sessions::handle_get_section),
        )
        .route(
            "/api/v1/sessions/:sid/sections/:section/fields",
            patch(sessions::handle_set_field),
        )
        .route(
            "/api/v1/sessions/:sid/sections/:section/items",
            post(sessions::handle_append_item),
        )
        .route(
            "/api/v1/sessions/:sid/sections/:section/items/:id",
            patch(sessions::handle_set_item_field).delete(sessions::handle_remove_item),
        )
        .route(
            "/api/v1/sessions/:sid/sections/:section/reorder",
            post(sessions::handle_reorder),
        )
        .route(
            "/api/v1/sessions/:sid/photo",
            put(sessions::handle_set_photo).delete(sessions::handle_remove_photo),
        )
        .route(
            "/api/v1/sessions/:sid/photo/:token",
            get(sessions::handle_photo_preview),
        )
        .route(
            "/api/v1/sessions/:sid/preview",
            get(sessions::handle_preview),
        )
        .route("/api/v1/sessions/:sid/save", post(sessions::handle_save))
        .route(
            "/api/v1/sessions/:sid/generate/work-experience",
            post(sessions::handle_generate_work_experience),
        )
        .route(
            "/api/v1/sessions/:sid/generate/project",
            post(sessions::handle_generate_project),
        )
        .route(
            "/api/v1/sessions/:sid/generate/summary",
            post(sessions::handle_generate_summary),
        )
        // Stored resumes
        .route("/api/v1/resumes", get(resumes::handle_list_resumes))
        .route("/api/v1/resumes/:id", delete(resumes::handle_delete_resume))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
