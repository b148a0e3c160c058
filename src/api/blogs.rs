//! Public blog endpoints
//!
//! - GET /api/blogs - Cached blog list (search, categoryId, page, limit)
//! - GET /api/blogs/{slug} - Blog detail
//! - GET /api/blogs/{slug}/related - Related posts, hidden on failure
//! - GET /api/youtube/latest - Latest YouTube posts
//! - GET /api/categories - Categories, empty on failure

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{BlogPost, Category};
use crate::services::listing::{BlogListView, BlogQuery, BlogSection};

/// Response for the category list
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

/// Build the public blog router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blogs", get(list_blogs))
        .route("/blogs/{slug}", get(get_blog))
        .route("/blogs/{slug}/related", get(related_blogs))
        .route("/youtube/latest", get(latest_videos))
        .route("/categories", get(list_categories))
}

/// GET /api/blogs
async fn list_blogs(
    State(state): State<AppState>,
    Query(mut query): Query<BlogQuery>,
) -> Result<Json<BlogListView>, ApiError> {
    // drafts only ever come through the admin table
    query.include_drafts = false;
    let view = state.listing.public_blogs(&query).await?;
    Ok(Json(view))
}

/// GET /api/blogs/{slug}
async fn get_blog(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    Ok(Json(state.listing.blog_detail(&slug).await?))
}

async fn related_blogs(State(state): State<AppState>, Path(slug): Path<String>) -> Json<BlogSection> {
    Json(state.listing.related(&slug).await)
}

async fn latest_videos(State(state): State<AppState>) -> Json<BlogSection> {
    Json(state.listing.latest_videos().await)
}

async fn list_categories(State(state): State<AppState>) -> Json<CategoryListResponse> {
    Json(CategoryListResponse {
        categories: state.listing.categories().await,
    })
}
