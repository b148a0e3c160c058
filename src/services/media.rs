//! Media attachment rules
//!
//! A post carries at most one piece of media: an uploaded image (stored
//! inline as a `data:image/...;base64,` URL), a remote image URL, or a
//! YouTube URL. This module provides:
//! - `MediaInput`, the single-slot attachment state used by the editor
//! - URL classification helpers, also used to derive player URLs for posts
//! - Upload checks (MIME type and size ceiling) and data URL encoding

use data_encoding::BASE64;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MediaType;

static YOUTUBE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([A-Za-z0-9_-]{11})")
        .expect("Invalid regex")
});

static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([A-Za-z0-9_-]{11})")
        .expect("Invalid regex")
});

static IMAGE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg)(\?.*)?$").expect("Invalid regex")
});

const DATA_IMAGE_PREFIX: &str = "data:image/";

/// Media validation errors, worded for display next to the media field
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MediaError {
    #[error("Please select an image file")]
    NotAnImage,

    #[error(
        "File size exceeds {}MB limit. Your file is {:.2}MB. Please choose a smaller image.",
        format_mb(.limit),
        megabytes(.size)
    )]
    TooLarge { size: u64, limit: u64 },

    #[error("Please enter a valid YouTube URL (e.g., https://www.youtube.com/watch?v=VIDEO_ID)")]
    InvalidYoutubeUrl,

    #[error("Please enter a valid image URL ending in .jpg, .jpeg, .png, .gif, .webp or .svg")]
    InvalidImageUrl,

    #[error("Uploaded image must be an inline data:image/ URL")]
    InvalidUpload,
}

fn megabytes(bytes: &u64) -> f64 {
    *bytes as f64 / 1024.0 / 1024.0
}

fn format_mb(bytes: &u64) -> String {
    let mb = megabytes(bytes);
    if mb.fract() == 0.0 {
        format!("{}", mb as u64)
    } else {
        format!("{:.2}", mb)
    }
}

/// Whether `url` is a YouTube watch, short or embed URL with an 11-character id
pub fn is_youtube_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}

/// Whether `url` points at an image file or is an inline image
pub fn is_image_url(url: &str) -> bool {
    IMAGE_URL.is_match(url) || url.starts_with(DATA_IMAGE_PREFIX)
}

/// Video id of a YouTube URL
pub fn extract_youtube_id(url: &str) -> Option<&str> {
    YOUTUBE_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Embeddable player URL for a YouTube link; other URLs come back unchanged
pub fn youtube_embed_url(url: &str) -> String {
    match extract_youtube_id(url) {
        Some(id) => format!("https://www.youtube.com/embed/{}", id),
        None => url.to_string(),
    }
}

/// Check an upload against the type and size rules
pub fn check_upload(mime_type: &str, size: u64, max_size: u64) -> Result<(), MediaError> {
    if !mime_type.starts_with("image/") {
        return Err(MediaError::NotAnImage);
    }
    if size > max_size {
        return Err(MediaError::TooLarge {
            size,
            limit: max_size,
        });
    }
    Ok(())
}

/// Encode file bytes as a `data:<mime>;base64,...` URL
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}

/// Single-slot media attachment.
///
/// Switching the kind always clears the stored value, so at most one
/// value is ever held and it belongs to the current kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInput {
    kind: Option<MediaType>,
    value: Option<String>,
}

impl MediaInput {
    pub fn none() -> Self {
        Self::default()
    }

    /// Rebuild the attachment from a stored or submitted (type, url) pair
    pub fn from_parts(kind: Option<MediaType>, value: Option<String>) -> Self {
        let mut media = Self::none();
        media.select(kind);
        if let Some(value) = value {
            media.set_url(&value);
        }
        media
    }

    pub fn kind(&self) -> Option<MediaType> {
        self.kind
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Switch media kind; the previous value is discarded
    pub fn select(&mut self, kind: Option<MediaType>) {
        self.kind = kind;
        self.value = None;
    }

    /// Store a URL typed in for the current kind. Checked by [`MediaInput::validate`].
    pub fn set_url(&mut self, url: &str) {
        if self.kind.is_none() {
            return;
        }
        let url = url.trim();
        self.value = if url.is_empty() {
            None
        } else {
            Some(url.to_string())
        };
    }

    /// Attach an uploaded image.
    ///
    /// The file is checked before it is encoded; a rejected upload leaves
    /// the attachment as it was.
    pub fn attach_upload(&mut self, mime_type: &str, bytes: &[u8], max_size: u64) -> Result<(), MediaError> {
        check_upload(mime_type, bytes.len() as u64, max_size)?;
        self.kind = Some(MediaType::Image);
        self.value = Some(to_data_url(mime_type, bytes));
        Ok(())
    }

    /// Check the stored value against the rules of its kind
    pub fn validate(&self) -> Result<(), MediaError> {
        let (kind, value) = match (self.kind, self.value.as_deref()) {
            (Some(kind), Some(value)) => (kind, value),
            _ => return Ok(()),
        };

        match kind {
            MediaType::Youtube if !is_youtube_url(value) => Err(MediaError::InvalidYoutubeUrl),
            MediaType::ImageUrl if !is_image_url(value) => Err(MediaError::InvalidImageUrl),
            MediaType::Image if !value.starts_with(DATA_IMAGE_PREFIX) => Err(MediaError::InvalidUpload),
            _ => Ok(()),
        }
    }

    /// The (type, url) pair to submit; a kind without a value means no media
    pub fn normalized(&self) -> (Option<MediaType>, Option<String>) {
        match (self.kind, &self.value) {
            (Some(kind), Some(value)) => (Some(kind), Some(value.clone())),
            _ => (None, None),
        }
    }
}
