//! Admin API endpoints
//!
//! Every route here sits behind the admin gate:
//! - GET /admin/dashboard - Stat cards and recent blogs
//! - GET /admin/blogs - Blog table (page, status, categoryId, search)
//! - POST /admin/blogs - Create a blog
//! - GET /admin/blogs/new - Blank editor
//! - GET /admin/blogs/{id}/edit - Editor for an existing blog
//! - PUT /admin/blogs/{id} - Update a blog
//! - DELETE /admin/blogs/{id} - Delete a blog
//! - POST /admin/media - Image upload to an inline media value

use axum::{
    extract::{Multipart, Path, Query, State},
    response::Redirect,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{AdminSession, ApiError, AppState};
use crate::models::MediaType;
use crate::services::dashboard::DashboardView;
use crate::services::editor::{
    BlogForm, EditorError, EditorMode, EditorView, SubmitOutcome, LOAD_FAILED_PATH,
};
use crate::services::listing::{AdminBlogTable, BlogQuery};

/// Response for a successful delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: String,
    /// The blog table should be reloaded
    pub refresh: bool,
}

/// Response for an accepted image upload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadResponse {
    pub media_type: MediaType,
    pub media_url: String,
    pub size: usize,
}

/// Build the admin router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/blogs", get(list_blogs).post(create_blog))
        .route("/blogs/new", get(new_blog))
        .route("/blogs/{id}/edit", get(edit_blog))
        .route("/blogs/{id}", put(update_blog).delete(delete_blog))
        .route("/media", post(upload_media))
}

/// Failed submission: the error plus the untouched form
fn submit_error(err: EditorError, form: BlogForm) -> ApiError {
    let fields = match &err {
        EditorError::Validation(fields) => fields.clone(),
        _ => Vec::new(),
    };
    ApiError::from(err).details(serde_json::json!({
        "fields": fields,
        "form": form,
    }))
}

/// GET /admin/dashboard
async fn dashboard(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Json<DashboardView>, ApiError> {
    let view = state.dashboard.load(&session.token).await?;
    Ok(Json(view))
}

/// GET /admin/blogs
async fn list_blogs(
    State(state): State<AppState>,
    session: AdminSession,
    Query(query): Query<BlogQuery>,
) -> Result<Json<AdminBlogTable>, ApiError> {
    let table = state.listing.admin_blogs(&session.token, query).await?;
    Ok(Json(table))
}

/// GET /admin/blogs/new
async fn new_blog(State(state): State<AppState>, session: AdminSession) -> Json<EditorView> {
    Json(state.editor.open_create(&session.token).await)
}

/// GET /admin/blogs/{id}/edit
///
/// A post that cannot be loaded sends the console back to the list.
async fn edit_blog(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<EditorView>, Redirect> {
    state
        .editor
        .open_edit(&session.token, &id)
        .await
        .map(Json)
        .map_err(|_| Redirect::to(LOAD_FAILED_PATH))
}

/// POST /admin/blogs
async fn create_blog(
    State(state): State<AppState>,
    session: AdminSession,
    Json(form): Json<BlogForm>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    match state.editor.submit(&session.token, &EditorMode::Create, &form).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => Err(submit_error(e, form)),
    }
}

/// PUT /admin/blogs/{id}
async fn update_blog(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
    Json(form): Json<BlogForm>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    match state.editor.submit(&session.token, &EditorMode::Edit(id), &form).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => Err(submit_error(e, form)),
    }
}

/// DELETE /admin/blogs/{id}
async fn delete_blog(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.editor.delete(&session.token, &id).await?;
    Ok(Json(DeleteResponse {
        deleted: id,
        refresh: true,
    }))
}

/// POST /admin/media
///
/// Accepts multipart/form-data with a single file field named "file".
async fn upload_media(
    State(state): State<AppState>,
    _session: AdminSession,
    mut multipart: Multipart,
) -> Result<Json<MediaUploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        let media = state.editor.upload_media(&content_type, &data)?;
        let (media_type, media_url) = media.normalized();
        return match (media_type, media_url) {
            (Some(media_type), Some(media_url)) => Ok(Json(MediaUploadResponse {
                media_type,
                media_url,
                size: data.len(),
            })),
            _ => Err(ApiError::internal_error("Upload produced no media")),
        };
    }

    Err(ApiError::validation_error("No file provided"))
}
