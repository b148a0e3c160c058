//! Blog editor
//!
//! This module provides:
//! - `BlogForm`, the editor's field values as the console submits them
//! - `BlogSubmission`, the body sent to the content API on create/update
//! - `EditorService` for loading, validating, submitting and deleting posts
//!
//! Validation runs before any network call. A failed submission hands the
//! form back untouched so nothing typed is lost.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::listing::ListingService;
use super::media::{MediaError, MediaInput};
use super::publish::{self, schedule_field_visible};
use crate::backend::{BackendError, DynBackend};
use crate::models::{BlogPost, BlogStatus, Category, MediaType, Tag};

/// Where the console goes after a successful save
pub const BLOG_LIST_PATH: &str = "/admin/blogs";

/// Where the console goes when a post cannot be loaded for editing
pub const LOAD_FAILED_PATH: &str = "/admin/blogs?error=load-failed";

pub const SEO_TITLE_MAX: usize = 60;
pub const SEO_DESCRIPTION_MAX: usize = 160;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

static EMBEDDED_MEDIA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(img|iframe|video)\b").expect("Invalid regex"));

// ============================================================================
// Form and submission
// ============================================================================

/// Editor field values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogForm {
    pub title: String,
    /// Rich-text HTML
    pub content: String,
    pub excerpt: String,
    pub category_id: String,
    pub seo_title: String,
    pub seo_description: String,
    /// Schedule field, `YYYY-MM-DDTHH:MM`
    pub published_at: String,
    pub publish_immediately: bool,
    pub media_type: Option<MediaType>,
    pub media_url: Option<String>,
    pub tag_ids: Vec<String>,
}

impl BlogForm {
    /// Pre-populate the form from a stored post
    pub fn from_post(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone().unwrap_or_default(),
            category_id: post.effective_category_id().unwrap_or_default().to_string(),
            seo_title: post.seo_title.clone().unwrap_or_default(),
            seo_description: post.seo_description.clone().unwrap_or_default(),
            published_at: post
                .published_at
                .map(publish::format_schedule)
                .unwrap_or_default(),
            publish_immediately: post.status == BlogStatus::Published,
            media_type: post.media_type,
            media_url: post.media_url.clone(),
            tag_ids: post.tag_ids(),
        }
    }

    pub fn media(&self) -> MediaInput {
        MediaInput::from_parts(self.media_type, self.media_url.clone())
    }

    /// Check every field and build the API body.
    ///
    /// All problems are reported at once, one entry per field.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<BlogSubmission, Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if !has_visible_content(&self.content) {
            errors.push(FieldError::new("content", "Content is required"));
        }
        if self.seo_title.chars().count() > SEO_TITLE_MAX {
            errors.push(FieldError::new(
                "seoTitle",
                format!("SEO title must be at most {} characters", SEO_TITLE_MAX),
            ));
        }
        if self.seo_description.chars().count() > SEO_DESCRIPTION_MAX {
            errors.push(FieldError::new(
                "seoDescription",
                format!("Meta description must be at most {} characters", SEO_DESCRIPTION_MAX),
            ));
        }

        let media = self.media();
        if let Err(e) = media.validate() {
            errors.push(FieldError::new("media", e.to_string()));
        }

        let scheduled_at = match publish::parse_schedule(&self.published_at) {
            Ok(at) => at,
            Err(e) => {
                errors.push(FieldError::new("publishedAt", e.to_string()));
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let (media_type, media_url) = media.normalized();
        let category_id = Some(self.category_id.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(BlogSubmission {
            title: self.title.trim().to_string(),
            content: self.content.clone(),
            excerpt: self.excerpt.trim().to_string(),
            category_id,
            seo_title: self.seo_title.trim().to_string(),
            seo_description: self.seo_description.trim().to_string(),
            tag_ids: self.tag_ids.clone(),
            media_type,
            media_url,
            publish_immediately: self.publish_immediately,
            status: BlogStatus::derive(self.publish_immediately, scheduled_at, now),
            published_at: scheduled_at.map(publish::to_wire),
        })
    }
}

/// Whether rich-text HTML shows anything: text, or an embedded image/video
pub fn has_visible_content(html: &str) -> bool {
    if EMBEDDED_MEDIA.is_match(html) {
        return true;
    }
    let text = HTML_TAG.replace_all(html, " ");
    !text.replace("&nbsp;", " ").trim().is_empty()
}

/// Body of a create/update call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSubmission {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category_id: Option<String>,
    pub seo_title: String,
    pub seo_description: String,
    pub tag_ids: Vec<String>,
    pub media_type: Option<MediaType>,
    pub media_url: Option<String>,
    pub publish_immediately: bool,
    pub status: BlogStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// Validation problem tied to one form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Which editor action failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Create,
    Update,
    Delete,
}

impl EditorAction {
    fn verb(&self) -> &'static str {
        match self {
            EditorAction::Create => "create",
            EditorAction::Update => "update",
            EditorAction::Delete => "delete",
        }
    }

    fn gerund(&self) -> &'static str {
        match self {
            EditorAction::Create => "creating",
            EditorAction::Update => "updating",
            EditorAction::Delete => "deleting",
        }
    }
}

/// Editor service errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EditorError {
    #[error("Please correct the highlighted fields")]
    Validation(Vec<FieldError>),

    /// The content API refused the change
    #[error("Error {} blog: {}", .action.gerund(), .message.as_deref().unwrap_or("Unknown error"))]
    Rejected {
        action: EditorAction,
        message: Option<String>,
    },

    /// The change never got a usable answer
    #[error("Failed to {} blog", .action.verb())]
    Failed { action: EditorAction },

    #[error("Blog post could not be loaded: {0}")]
    LoadFailed(BackendError),

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl EditorError {
    fn from_backend(action: EditorAction, err: BackendError) -> Self {
        if err.is_rejection() {
            EditorError::Rejected {
                action,
                message: err.server_message().map(str::to_string),
            }
        } else {
            EditorError::Failed { action }
        }
    }
}

// ============================================================================
// Editor service
// ============================================================================

/// Create or edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(String),
}

/// Everything the editor page needs to render
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub mode: &'static str,
    pub blog_id: Option<String>,
    pub form: BlogForm,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub schedule_visible: bool,
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub redirect: &'static str,
}

/// Editor workflow over the content API
pub struct EditorService {
    backend: DynBackend,
    listing: Arc<ListingService>,
    max_upload_size: u64,
}

impl EditorService {
    pub fn new(backend: DynBackend, listing: Arc<ListingService>, max_upload_size: u64) -> Self {
        Self {
            backend,
            listing,
            max_upload_size,
        }
    }

    /// Categories and tags for the pickers, fetched in parallel.
    ///
    /// Either list degrades to empty on failure.
    pub async fn reference_data(&self, token: &str) -> (Vec<Category>, Vec<Tag>) {
        let (categories, tags) = tokio::join!(self.listing.categories(), self.backend.list_tags(token));
        let tags = tags.unwrap_or_else(|e| {
            tracing::warn!("Failed to load tags: {}", e);
            Vec::new()
        });
        (categories, tags)
    }

    /// Blank editor for a new post
    pub async fn open_create(&self, token: &str) -> EditorView {
        let (categories, tags) = self.reference_data(token).await;
        let form = BlogForm::default();
        EditorView {
            mode: "create",
            blog_id: None,
            schedule_visible: schedule_field_visible(form.publish_immediately),
            form,
            categories,
            tags,
        }
    }

    /// Editor pre-populated from an existing post
    pub async fn open_edit(&self, token: &str, id: &str) -> Result<EditorView, EditorError> {
        let (post, (categories, tags)) = tokio::join!(
            self.backend.admin_get_blog(token, id),
            self.reference_data(token)
        );
        let post = post.map_err(|e| {
            tracing::error!("Failed to load blog {} for editing: {}", id, e);
            EditorError::LoadFailed(e)
        })?;

        let form = BlogForm::from_post(&post);
        Ok(EditorView {
            mode: "edit",
            blog_id: Some(post.id),
            schedule_visible: schedule_field_visible(form.publish_immediately),
            form,
            categories,
            tags,
        })
    }

    /// Validate and save. No retries.
    pub async fn submit(&self, token: &str, mode: &EditorMode, form: &BlogForm) -> Result<SubmitOutcome, EditorError> {
        let submission = form.validate(Utc::now()).map_err(EditorError::Validation)?;

        let (action, result) = match mode {
            EditorMode::Create => (
                EditorAction::Create,
                self.backend.create_blog(token, &submission).await,
            ),
            EditorMode::Edit(id) => (
                EditorAction::Update,
                self.backend.update_blog(token, id, &submission).await,
            ),
        };

        if let Err(e) = result {
            tracing::error!("Failed to {} blog: {}", action.verb(), e);
            return Err(EditorError::from_backend(action, e));
        }

        tracing::info!("Blog {}d with status {}", action.verb(), submission.status);
        self.listing.invalidate_public_lists().await;
        Ok(SubmitOutcome {
            redirect: BLOG_LIST_PATH,
        })
    }

    /// Delete a post; the caller refreshes its list on success
    pub async fn delete(&self, token: &str, id: &str) -> Result<(), EditorError> {
        if let Err(e) = self.backend.delete_blog(token, id).await {
            tracing::error!("Failed to delete blog {}: {}", id, e);
            return Err(EditorError::from_backend(EditorAction::Delete, e));
        }
        tracing::info!("Blog {} deleted", id);
        self.listing.invalidate_public_lists().await;
        Ok(())
    }

    /// Turn an uploaded file into an inline image attachment
    pub fn upload_media(&self, mime_type: &str, bytes: &[u8]) -> Result<MediaInput, EditorError> {
        let mut media = MediaInput::none();
        media.attach_upload(mime_type, bytes, self.max_upload_size)?;
        Ok(media)
    }
}
