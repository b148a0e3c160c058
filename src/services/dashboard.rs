//! Admin dashboard

use serde::Serialize;

use super::listing::BlogQuery;
use crate::backend::{BackendError, DynBackend};
use crate::models::{BlogPost, DashboardStats};

/// Posts pulled for the dashboard table
pub const DASHBOARD_BLOG_LIMIT: u32 = 100;

/// Compact display form: `999`, `1.2K`, `3.4M`, `1.0B`
pub fn format_number(n: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];

    for (size, suffix) in UNITS {
        if n >= size {
            return format!("{:.1}{}", n as f64 / size as f64, suffix);
        }
    }
    n.to_string()
}

/// Caption under a growth figure
pub fn growth_caption(growth: f64, base: u64, period: &str, empty: &str) -> String {
    if growth > 0.0 {
        format!("+{:.1}% {}", growth, period)
    } else if base > 0 {
        format!("No growth {}", period)
    } else {
        empty.to_string()
    }
}

/// Dashboard stat card
#[derive(Debug, Clone, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub cards: Vec<StatCard>,
    pub recent_blogs: Vec<BlogPost>,
}

pub struct DashboardService {
    backend: DynBackend,
}

impl DashboardService {
    pub fn new(backend: DynBackend) -> Self {
        Self { backend }
    }

    /// Stats and the blog table, loaded together
    pub async fn load(&self, token: &str) -> Result<DashboardView, BackendError> {
        let query = BlogQuery {
            limit: Some(DASHBOARD_BLOG_LIMIT),
            include_drafts: true,
            ..Default::default()
        };

        let (stats, blogs) = tokio::join!(
            self.backend.dashboard_stats(token),
            self.backend.admin_list_blogs(token, &query)
        );
        let stats = stats?;
        let recent_blogs = blogs.map(|page| page.blogs).unwrap_or_else(|e| {
            tracing::warn!("Failed to load dashboard blogs: {}", e);
            Vec::new()
        });

        let cards = vec![
            StatCard {
                label: "Total Subscribers",
                value: format_number(stats.total_subscribers),
                caption: Some(growth_caption(
                    stats.subscriber_growth,
                    stats.total_subscribers,
                    "this month",
                    "No subscribers yet",
                )),
            },
            StatCard {
                label: "Active Blogs",
                value: format_number(stats.active_blogs),
                caption: Some(format!("{} drafts", stats.draft_blogs)),
            },
            StatCard {
                label: "Monthly Views",
                value: format_number(stats.monthly_views),
                caption: Some(growth_caption(
                    stats.views_growth,
                    stats.monthly_views,
                    "vs last month",
                    "No views yet",
                )),
            },
            StatCard {
                label: "Telegram Users",
                value: format_number(stats.telegram_users),
                caption: None,
            },
        ];

        Ok(DashboardView {
            stats,
            cards,
            recent_blogs,
        })
    }
}
