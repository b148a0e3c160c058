//! Category model

use serde::{Deserialize, Serialize};

/// Blog category; read-only on this side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}
