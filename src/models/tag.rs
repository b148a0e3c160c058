//! Tag model

use serde::{Deserialize, Serialize};

/// Tag that can be attached to blog posts.
///
/// Tags are managed by the content API; the editor only selects them by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}
