//! Admin gate
//!
//! Decides whether a request may see admin content. The verdict comes from
//! the content API's identity endpoint; no role is ever inferred locally.
//!
//! ```text
//! no token ───────────────────────────────► Unauthenticated
//! token ─► /auth/me ─┬─ 401 ──────────────► Unauthenticated
//!                    ├─ role Admin ───────► Admin
//!                    ├─ role Member ──────► Denied(NotAdmin)
//!                    └─ any other failure ► Denied(CheckFailed)
//! ```

use serde::Serialize;

use crate::backend::DynBackend;
use crate::models::{CurrentUser, Role};

/// Message shown on the access-denied page
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied. Admin privileges required.";

/// Why a signed-in request was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Signed in without admin rights
    NotAdmin,
    /// The identity check itself failed
    CheckFailed,
}

/// Outcome of the admin gate
#[derive(Debug, Clone, PartialEq)]
pub enum GateState {
    Admin(CurrentUser),
    Denied(DenialReason),
    Unauthenticated,
}

/// Admin authorization check backed by the identity endpoint
#[derive(Clone)]
pub struct AdminGate {
    backend: DynBackend,
}

impl AdminGate {
    pub fn new(backend: DynBackend) -> Self {
        Self { backend }
    }

    /// Evaluate a request's session token. Never retries.
    pub async fn evaluate(&self, token: Option<&str>) -> GateState {
        let token = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => return GateState::Unauthenticated,
        };

        match self.backend.current_user(token).await {
            Ok(user) => match user.role {
                Role::Admin => GateState::Admin(user),
                Role::Member => {
                    tracing::info!("Admin access denied for {}", user.email);
                    GateState::Denied(DenialReason::NotAdmin)
                }
            },
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("Session rejected by identity check: {}", e);
                GateState::Unauthenticated
            }
            Err(e) => {
                tracing::warn!("Admin check failed: {}", e);
                GateState::Denied(DenialReason::CheckFailed)
            }
        }
    }
}
