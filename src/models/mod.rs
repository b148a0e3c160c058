//! Data models
//!
//! Wire types of the content API. The API owns every entity; these are the
//! transient copies the console works with:
//! - Blog posts, categories and tags
//! - Newsletter subscribers
//! - The signed-in user and their role
//! - Dashboard statistics

mod blog;
mod category;
mod dashboard;
mod subscriber;
mod tag;
mod user;

pub use blog::{BlogPage, BlogPost, BlogStatus, MediaType, Pagination, TagLink};
pub use category::Category;
pub use dashboard::DashboardStats;
pub use subscriber::{Subscriber, SubscriberUser};
pub use tag::Tag;
pub use user::{CurrentUser, Role};
