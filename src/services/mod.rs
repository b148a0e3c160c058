//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the content API:
//! - Admin gate and editor workflow
//! - Listing views and the cached public blog list
//! - Subscriber export and dashboard figures

pub mod auth;
pub mod dashboard;
pub mod editor;
pub mod health;
pub mod listing;
pub mod media;
pub mod publish;
pub mod subscriber;

pub use auth::{AdminGate, DenialReason, GateState};
pub use dashboard::DashboardService;
pub use editor::{BlogForm, BlogSubmission, EditorError, EditorMode, EditorService};
pub use listing::{BlogQuery, InfiniteFeed, ListingService};
pub use media::{MediaError, MediaInput};
pub use subscriber::SubscriberService;
