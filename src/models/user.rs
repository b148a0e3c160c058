//! Current user model
//!
//! The identity endpoint reports admin rights as an `isAdmin` boolean. That
//! flag is decoded here into the closed [`Role`] enum and nothing past this
//! module looks at the raw boolean.

use serde::{Deserialize, Serialize};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May use the admin console
    Admin,
    /// Signed-in user without admin rights
    Member,
}

impl Role {
    fn from_admin_flag(is_admin: bool) -> Self {
        if is_admin {
            Role::Admin
        } else {
            Role::Member
        }
    }
}

/// Identity returned by `GET /api/v1/auth/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireUser")]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUser {
    #[serde(default)]
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: Option<String>,
    // Only a literal `true` grants admin
    #[serde(default)]
    is_admin: Option<bool>,
}

impl From<WireUser> for CurrentUser {
    fn from(wire: WireUser) -> Self {
        Self {
            id: wire.id,
            email: wire.email,
            name: wire.name,
            role: Role::from_admin_flag(wire.is_admin == Some(true)),
        }
    }
}
