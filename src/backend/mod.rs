//! Content API client layer
//!
//! Every entity lives in the external content API. This module provides:
//! - `BlogBackend` trait defining the calls the console makes
//! - `HttpBackend` implementing the trait over reqwest
//! - `BackendError` covering transport, status, envelope and decode failures
//!
//! Responses use the envelope `{ success, data, error?: { message } }`.

pub mod http;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{BlogPage, BlogPost, Category, CurrentUser, DashboardStats, Subscriber, Tag};
use crate::services::editor::BlogSubmission;
use crate::services::listing::BlogQuery;

pub use http::HttpBackend;

/// Shared handle to the content API
pub type DynBackend = Arc<dyn BlogBackend>;

/// Content API errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// The request never produced a response (connect, timeout, body read)
    #[error("Request failed: {0}")]
    Transport(String),

    /// Non-2xx status, with the envelope's error message when it carried one
    #[error("Content API returned HTTP {status}")]
    Status { status: u16, message: Option<String> },

    /// 2xx response whose envelope says `success: false`
    #[error("Content API rejected the request")]
    Rejected(Option<String>),

    /// Response body did not have the expected shape
    #[error("Invalid response from content API: {0}")]
    Decode(String),
}

impl BackendError {
    /// The identity could not be established (expired or invalid token)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Status { status: 401, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::Status { status: 404, .. })
    }

    /// The API answered and refused, as opposed to never answering usefully
    pub fn is_rejection(&self) -> bool {
        matches!(self, BackendError::Status { .. } | BackendError::Rejected(_))
    }

    /// Message supplied by the API, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            BackendError::Status { message, .. } | BackendError::Rejected(message) => {
                message.as_deref()
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

// Cache encode/decode failures surface as bad payloads
impl From<anyhow::Error> for BackendError {
    fn from(err: anyhow::Error) -> Self {
        BackendError::Decode(format!("{:#}", err))
    }
}

/// Response envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
pub struct EnvelopeError {
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    fn error_message(&mut self) -> Option<String> {
        self.error.take().and_then(|e| e.message)
    }

    /// Unwrap the payload of a successful envelope
    pub fn into_data(mut self) -> Result<T, BackendError> {
        if !self.success {
            return Err(BackendError::Rejected(self.error_message()));
        }
        self.data
            .ok_or_else(|| BackendError::Decode("missing data".to_string()))
    }

    /// Check a successful envelope whose payload is not needed
    pub fn into_ack(mut self) -> Result<(), BackendError> {
        if self.success {
            Ok(())
        } else {
            Err(BackendError::Rejected(self.error_message()))
        }
    }
}

/// Calls the console makes against the content API.
///
/// Admin calls take the caller's session token, forwarded as a bearer token.
#[async_trait]
pub trait BlogBackend: Send + Sync {
    /// `GET /auth/me`
    async fn current_user(&self, token: &str) -> Result<CurrentUser, BackendError>;

    /// Public blog list
    async fn list_blogs(&self, query: &BlogQuery) -> Result<BlogPage, BackendError>;

    /// Public blog by slug
    async fn get_blog(&self, slug: &str) -> Result<BlogPost, BackendError>;

    async fn related_blogs(&self, slug: &str, limit: u32) -> Result<Vec<BlogPost>, BackendError>;

    /// Most recent posts carrying a YouTube video
    async fn latest_youtube(&self, limit: u32) -> Result<Vec<BlogPost>, BackendError>;

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError>;

    async fn list_tags(&self, token: &str) -> Result<Vec<Tag>, BackendError>;

    /// Admin blog list, drafts included on request
    async fn admin_list_blogs(&self, token: &str, query: &BlogQuery) -> Result<BlogPage, BackendError>;

    async fn admin_get_blog(&self, token: &str, id: &str) -> Result<BlogPost, BackendError>;

    async fn create_blog(&self, token: &str, blog: &BlogSubmission) -> Result<(), BackendError>;

    async fn update_blog(&self, token: &str, id: &str, blog: &BlogSubmission) -> Result<(), BackendError>;

    async fn delete_blog(&self, token: &str, id: &str) -> Result<(), BackendError>;

    async fn list_subscribers(&self, token: &str) -> Result<Vec<Subscriber>, BackendError>;

    async fn dashboard_stats(&self, token: &str) -> Result<DashboardStats, BackendError>;
}
