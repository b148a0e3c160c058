//! Blog post model
//!
//! This module provides:
//! - `BlogPost` as returned by the content API (camelCase wire shape)
//! - `BlogStatus` and `MediaType` enums
//! - `Pagination` and `BlogPage` for list responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{Category, Tag};

/// Blog post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// Rich-text HTML body
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagLink>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub status: BlogStatus,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub read_time_minutes: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Video id of a YouTube post, filled in by the console
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub youtube_id: Option<String>,
    /// Embeddable player URL of a YouTube post, filled in by the console
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
}

impl BlogPost {
    /// Ids of the attached tags, in wire order
    pub fn tag_ids(&self) -> Vec<String> {
        self.tags.iter().map(|link| link.tag.id.clone()).collect()
    }

    /// Category id, falling back to the embedded category
    pub fn effective_category_id(&self) -> Option<&str> {
        self.category_id
            .as_deref()
            .or_else(|| self.category.as_ref().map(|c| c.id.as_str()))
    }
}

/// Join row between a post and a tag: `{ "tag": { id, name, slug } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagLink {
    pub tag: Tag,
}

/// Publication status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlogStatus {
    /// Not visible to the public
    #[default]
    Draft,
    /// Becomes visible at `publishedAt`
    Scheduled,
    /// Visible to the public
    Published,
}

impl BlogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogStatus::Draft => "DRAFT",
            BlogStatus::Scheduled => "SCHEDULED",
            BlogStatus::Published => "PUBLISHED",
        }
    }
}

impl FromStr for BlogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(BlogStatus::Draft),
            "SCHEDULED" => Ok(BlogStatus::Scheduled),
            "PUBLISHED" => Ok(BlogStatus::Published),
            _ => Err(format!("Invalid blog status: {}", s)),
        }
    }
}

impl std::fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of media attached to a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    /// Uploaded image stored inline as a `data:image/...` URL
    Image,
    /// Remote image URL
    ImageUrl,
    /// YouTube video URL
    Youtube,
}

/// Pagination block of a list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_page")]
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 0,
            total: 0,
            total_pages: 1,
        }
    }
}

/// One page of blog posts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogPage {
    #[serde(default)]
    pub blogs: Vec<BlogPost>,
    #[serde(default)]
    pub pagination: Pagination,
}
