//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The API error body and its status mapping
//! - Request statistics
//! - The admin gate (layout middleware plus a leaf-handler extractor)

use axum::{
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::{header, request::Parts, Extensions, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::backend::{BackendError, DynBackend};
use crate::cache::create_cache;
use crate::config::Config;
use crate::models::CurrentUser;
use crate::services::auth::{DenialReason, GateState, ACCESS_DENIED_MESSAGE};
use crate::services::editor::EditorError;
use crate::services::{
    AdminGate, DashboardService, EditorService, ListingService, SubscriberService,
};

// ============================================================================
// Request Statistics
// ============================================================================

/// Lightweight request statistics using atomic operations (no locks)
pub struct RequestStats {
    total_requests: AtomicU64,
    /// Total response time in microseconds (for calculating average)
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a request with its response time
    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us.fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Application state
// ============================================================================

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: AdminGate,
    pub listing: Arc<ListingService>,
    pub editor: Arc<EditorService>,
    pub subscribers: Arc<SubscriberService>,
    pub dashboard: Arc<DashboardService>,
    pub request_stats: Arc<RequestStats>,
}

impl AppState {
    /// Wire every service to one content API handle
    pub fn new(config: Config, backend: DynBackend) -> Self {
        let cache = create_cache(&config.cache);
        let listing = Arc::new(ListingService::new(backend.clone(), cache));
        let editor = Arc::new(EditorService::new(
            backend.clone(),
            listing.clone(),
            config.upload.max_file_size,
        ));

        Self {
            gate: AdminGate::new(backend.clone()),
            listing,
            editor,
            subscribers: Arc::new(SubscriberService::new(backend.clone())),
            dashboard: Arc::new(DashboardService::new(backend)),
            request_stats: Arc::new(RequestStats::new()),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::new("BACKEND_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Attach or replace the details payload
    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "SUBMIT_FAILED" => StatusCode::UNPROCESSABLE_ENTITY,
            "BACKEND_ERROR" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        if err.is_unauthorized() {
            ApiError::unauthorized("Session expired or invalid")
        } else if err.is_not_found() {
            ApiError::not_found(err.server_message().unwrap_or("Not found"))
        } else {
            ApiError::backend_error(err.to_string())
        }
    }
}

impl From<EditorError> for ApiError {
    fn from(err: EditorError) -> Self {
        let message = err.to_string();
        match err {
            EditorError::Validation(fields) => ApiError::with_details(
                "VALIDATION_ERROR",
                message,
                serde_json::json!({ "fields": fields }),
            ),
            EditorError::Media(_) => ApiError::validation_error(message),
            EditorError::LoadFailed(e) => e.into(),
            EditorError::Rejected { .. } | EditorError::Failed { .. } => {
                ApiError::new("SUBMIT_FAILED", message)
            }
        }
    }
}

// ============================================================================
// Admin gate
// ============================================================================

/// Session token from `Authorization: Bearer` or the `session` cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Sign-in entry point that returns to `path` afterwards
pub fn login_redirect_target(path: &str) -> String {
    format!("/?redirect={}&login=true", urlencoding::encode(path))
}

/// Verified admin identity plus the token to forward to the content API
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub user: CurrentUser,
    pub token: String,
}

fn access_denied(reason: DenialReason) -> Response {
    ApiError::forbidden(ACCESS_DENIED_MESSAGE)
        .details(serde_json::json!({
            "reason": reason,
            "home": "/",
            "back": true,
        }))
        .into_response()
}

/// Full request path, including any prefix a parent router stripped
fn request_path(extensions: &Extensions, uri: &Uri) -> String {
    extensions
        .get::<OriginalUri>()
        .map(|original| original.path())
        .unwrap_or_else(|| uri.path())
        .to_string()
}

/// Run the gate for a request; non-admin outcomes become the response to send
async fn admit(state: &AppState, headers: &HeaderMap, path: &str) -> Result<AdminSession, Response> {
    let token = extract_session_token(headers);

    match state.gate.evaluate(token.as_deref()).await {
        GateState::Admin(user) => Ok(AdminSession {
            user,
            token: token.unwrap_or_default().trim().to_string(),
        }),
        GateState::Unauthenticated => {
            tracing::debug!("Unauthenticated request for {}", path);
            Err(Redirect::to(&login_redirect_target(path)).into_response())
        }
        GateState::Denied(reason) => Err(access_denied(reason)),
    }
}

/// Layout-level admin gate
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request_path(request.extensions(), request.uri());
    match admit(&state, request.headers(), &path).await {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(response) => response,
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Response;

    /// Reuses the layout verdict; evaluates again when mounted without it
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<AdminSession>() {
            return Ok(session.clone());
        }
        let path = request_path(&parts.extensions, &parts.uri);
        admit(state, &parts.headers, &path).await
    }
}

/// Request statistics middleware
///
/// Records request count and response time.
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state.request_stats.record(start.elapsed().as_micros() as u64);
    response
}
