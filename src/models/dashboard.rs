//! Dashboard statistics model

use serde::{Deserialize, Serialize};

/// Headline numbers for the admin dashboard.
///
/// Any field the API leaves out reads as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_subscribers: u64,
    pub active_blogs: u64,
    pub draft_blogs: u64,
    pub monthly_views: u64,
    pub telegram_users: u64,
    /// Percent change against the previous period
    pub subscriber_growth: f64,
    pub views_growth: f64,
}
