//! Newsletter subscribers: search and CSV export

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::backend::{BackendError, DynBackend};
use crate::models::Subscriber;

pub const CSV_HEADER: &str = "Email,Name,Status,Subscribed At,Unsubscribed At";

/// Case-insensitive match on email or linked user name; blank matches all
pub fn matches_search(subscriber: &Subscriber, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    subscriber.email.to_lowercase().contains(&needle)
        || subscriber
            .display_name()
            .map_or(false, |name| name.to_lowercase().contains(&needle))
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn csv_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Render subscribers as CSV; data cells are always quoted
pub fn to_csv(subscribers: &[Subscriber]) -> String {
    let mut lines = Vec::with_capacity(subscribers.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for sub in subscribers {
        let cells = [
            sub.email.clone(),
            sub.display_name().unwrap_or_default().to_string(),
            if sub.is_active { "Active" } else { "Inactive" }.to_string(),
            csv_date(&sub.subscribed_at),
            sub.unsubscribed_at.as_ref().map(csv_date).unwrap_or_default(),
        ];
        let row: Vec<String> = cells.iter().map(|c| quote(c)).collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("subscribers-{}.csv", date.format("%Y-%m-%d"))
}

/// Subscriber table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberList {
    pub subscribers: Vec<Subscriber>,
    pub total: usize,
    pub active: usize,
}

/// Ready-to-download CSV
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

pub struct SubscriberService {
    backend: DynBackend,
}

impl SubscriberService {
    pub fn new(backend: DynBackend) -> Self {
        Self { backend }
    }

    /// Subscribers matching `search`; totals count the whole list
    pub async fn list(&self, token: &str, search: Option<&str>) -> Result<SubscriberList, BackendError> {
        let all = self.backend.list_subscribers(token).await?;
        let total = all.len();
        let active = all.iter().filter(|s| s.is_active).count();
        let search = search.unwrap_or_default();

        Ok(SubscriberList {
            subscribers: all.into_iter().filter(|s| matches_search(s, search)).collect(),
            total,
            active,
        })
    }

    /// Export every subscriber, named after `today`
    pub async fn export(&self, token: &str, today: NaiveDate) -> Result<CsvExport, BackendError> {
        let all = self.backend.list_subscribers(token).await?;
        tracing::info!("Exporting {} subscribers", all.len());
        Ok(CsvExport {
            filename: export_filename(today),
            body: to_csv(&all),
        })
    }
}
