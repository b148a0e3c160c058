//! Subscriber endpoints (admin)
//!
//! - GET /admin/subscribers?search= - Filtered table with totals
//! - GET /admin/subscribers/export - CSV download of every subscriber

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{AdminSession, ApiError, AppState};
use crate::services::subscriber::SubscriberList;

#[derive(Debug, Default, Deserialize)]
pub struct SubscriberSearch {
    #[serde(default)]
    pub search: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribers", get(list_subscribers))
        .route("/subscribers/export", get(export_subscribers))
}

async fn list_subscribers(
    State(state): State<AppState>,
    session: AdminSession,
    Query(query): Query<SubscriberSearch>,
) -> Result<Json<SubscriberList>, ApiError> {
    let list = state
        .subscribers
        .list(&session.token, query.search.as_deref())
        .await?;
    Ok(Json(list))
}

/// GET /admin/subscribers/export
async fn export_subscribers(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<impl IntoResponse, ApiError> {
    let today = chrono::Utc::now().date_naive();
    let export = state.subscribers.export(&session.token, today).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv;charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.body,
    ))
}
