//! In-memory content API for tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BackendError, BlogBackend};
use crate::models::{
    BlogPage, BlogPost, BlogStatus, Category, CurrentUser, DashboardStats, MediaType, Pagination,
    Role, Subscriber, Tag,
};
use crate::services::editor::BlogSubmission;
use crate::services::listing::BlogQuery;

/// A create or update that reached the API
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSubmission {
    pub id: Option<String>,
    pub token: String,
    pub blog: BlogSubmission,
}

/// Test double for [`BlogBackend`] with call counters
#[derive(Default)]
pub struct FakeBackend {
    users: Mutex<HashMap<String, CurrentUser>>,
    auth_failure: Mutex<Option<BackendError>>,
    blogs: Mutex<Vec<BlogPost>>,
    categories: Mutex<Option<Result<Vec<Category>, BackendError>>>,
    tags: Mutex<Option<Result<Vec<Tag>, BackendError>>>,
    subscribers: Mutex<Vec<Subscriber>>,
    stats: Mutex<DashboardStats>,
    submit_failure: Mutex<Option<BackendError>>,
    list_failure: Mutex<Option<BackendError>>,
    list_delay: Mutex<Option<Duration>>,
    pub submissions: Mutex<Vec<RecordedSubmission>>,
    pub deleted: Mutex<Vec<String>>,
    pub auth_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub admin_list_queries: Mutex<Vec<BlogQuery>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn with_user(self, token: &str, role: Role) -> Self {
        let user = CurrentUser {
            id: format!("user-{}", token),
            email: format!("{}@techzone.test", token),
            name: Some(token.to_string()),
            role,
        };
        lock(&self.users).insert(token.to_string(), user);
        self
    }

    pub fn with_admin(self, token: &str) -> Self {
        self.with_user(token, Role::Admin)
    }

    pub fn with_member(self, token: &str) -> Self {
        self.with_user(token, Role::Member)
    }

    /// Every identity lookup fails with `err`
    pub fn with_auth_failure(self, err: BackendError) -> Self {
        *lock(&self.auth_failure) = Some(err);
        self
    }

    pub fn with_blogs(self, blogs: Vec<BlogPost>) -> Self {
        *lock(&self.blogs) = blogs;
        self
    }

    pub fn with_categories(self, categories: Result<Vec<Category>, BackendError>) -> Self {
        *lock(&self.categories) = Some(categories);
        self
    }

    pub fn with_tags(self, tags: Result<Vec<Tag>, BackendError>) -> Self {
        *lock(&self.tags) = Some(tags);
        self
    }

    pub fn with_subscribers(self, subscribers: Vec<Subscriber>) -> Self {
        *lock(&self.subscribers) = subscribers;
        self
    }

    pub fn with_stats(self, stats: DashboardStats) -> Self {
        *lock(&self.stats) = stats;
        self
    }

    /// Create, update and delete fail with `err`
    pub fn with_submit_failure(self, err: BackendError) -> Self {
        *lock(&self.submit_failure) = Some(err);
        self
    }

    /// List calls fail with `err`
    pub fn with_list_failure(self, err: BackendError) -> Self {
        *lock(&self.list_failure) = Some(err);
        self
    }

    /// Public list calls sleep before answering
    pub fn with_list_delay(self, delay: Duration) -> Self {
        *lock(&self.list_delay) = Some(delay);
        self
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn auth_call_count(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn recorded_submissions(&self) -> Vec<RecordedSubmission> {
        lock(&self.submissions).clone()
    }

    fn page(&self, query: &BlogQuery, include_drafts: bool) -> Result<BlogPage, BackendError> {
        if let Some(err) = lock(&self.list_failure).clone() {
            return Err(err);
        }

        let filtered: Vec<BlogPost> = lock(&self.blogs)
            .iter()
            .filter(|b| include_drafts || b.status == BlogStatus::Published)
            .filter(|b| query.status.map_or(true, |s| b.status == s))
            .filter(|b| {
                query.category_id.as_deref().map_or(true, |c| b.effective_category_id() == Some(c))
            })
            .filter(|b| {
                query.search.as_deref().map_or(true, |s| {
                    b.title.to_lowercase().contains(&s.to_lowercase())
                })
            })
            .cloned()
            .collect();

        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(10).max(1);
        let total = filtered.len() as u64;
        let total_pages = ((total as u32).div_ceil(limit)).max(1);
        let blogs = filtered
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();

        Ok(BlogPage {
            blogs,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages,
            },
        })
    }

    fn find(&self, pred: impl Fn(&BlogPost) -> bool) -> Result<BlogPost, BackendError> {
        lock(&self.blogs)
            .iter()
            .find(|b| pred(b))
            .cloned()
            .ok_or(BackendError::Status {
                status: 404,
                message: Some("Blog not found".to_string()),
            })
    }

    fn record(&self, token: &str, id: Option<&str>, blog: &BlogSubmission) -> Result<(), BackendError> {
        if let Some(err) = lock(&self.submit_failure).clone() {
            return Err(err);
        }
        lock(&self.submissions).push(RecordedSubmission {
            id: id.map(str::to_string),
            token: token.to_string(),
            blog: blog.clone(),
        });
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Blog post fixture with sensible defaults
pub fn blog(id: &str, title: &str, status: BlogStatus) -> BlogPost {
    BlogPost {
        id: id.to_string(),
        title: title.to_string(),
        slug: id.to_string(),
        content: format!("<p>{}</p>", title),
        excerpt: None,
        category: None,
        category_id: None,
        tags: vec![],
        media_type: None,
        media_url: None,
        status,
        published_at: None,
        seo_title: None,
        seo_description: None,
        views: 0,
        read_time_minutes: None,
        created_at: None,
        updated_at: None,
        youtube_id: None,
        embed_url: None,
    }
}

#[async_trait]
impl BlogBackend for FakeBackend {
    async fn current_user(&self, token: &str) -> Result<CurrentUser, BackendError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.auth_failure).clone() {
            return Err(err);
        }
        lock(&self.users)
            .get(token)
            .cloned()
            .ok_or(BackendError::Status {
                status: 401,
                message: Some("Invalid or expired token".to_string()),
            })
    }

    async fn list_blogs(&self, query: &BlogQuery) -> Result<BlogPage, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.list_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.page(query, false)
    }

    async fn get_blog(&self, slug: &str) -> Result<BlogPost, BackendError> {
        self.find(|b| b.slug == slug && b.status == BlogStatus::Published)
    }

    async fn related_blogs(&self, slug: &str, limit: u32) -> Result<Vec<BlogPost>, BackendError> {
        if let Some(err) = lock(&self.list_failure).clone() {
            return Err(err);
        }
        Ok(lock(&self.blogs)
            .iter()
            .filter(|b| b.slug != slug && b.status == BlogStatus::Published)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn latest_youtube(&self, limit: u32) -> Result<Vec<BlogPost>, BackendError> {
        if let Some(err) = lock(&self.list_failure).clone() {
            return Err(err);
        }
        Ok(lock(&self.blogs)
            .iter()
            .filter(|b| b.media_type == Some(MediaType::Youtube))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        lock(&self.categories).clone().unwrap_or_else(|| Ok(vec![]))
    }

    async fn list_tags(&self, _token: &str) -> Result<Vec<Tag>, BackendError> {
        lock(&self.tags).clone().unwrap_or_else(|| Ok(vec![]))
    }

    async fn admin_list_blogs(&self, _token: &str, query: &BlogQuery) -> Result<BlogPage, BackendError> {
        lock(&self.admin_list_queries).push(query.clone());
        self.page(query, query.include_drafts)
    }

    async fn admin_get_blog(&self, _token: &str, id: &str) -> Result<BlogPost, BackendError> {
        self.find(|b| b.id == id)
    }

    async fn create_blog(&self, token: &str, blog: &BlogSubmission) -> Result<(), BackendError> {
        self.record(token, None, blog)
    }

    async fn update_blog(&self, token: &str, id: &str, blog: &BlogSubmission) -> Result<(), BackendError> {
        self.find(|b| b.id == id)?;
        self.record(token, Some(id), blog)
    }

    async fn delete_blog(&self, _token: &str, id: &str) -> Result<(), BackendError> {
        if let Some(err) = lock(&self.submit_failure).clone() {
            return Err(err);
        }
        self.find(|b| b.id == id)?;
        lock(&self.blogs).retain(|b| b.id != id);
        lock(&self.deleted).push(id.to_string());
        Ok(())
    }

    async fn list_subscribers(&self, _token: &str) -> Result<Vec<Subscriber>, BackendError> {
        Ok(lock(&self.subscribers).clone())
    }

    async fn dashboard_stats(&self, _token: &str) -> Result<DashboardStats, BackendError> {
        Ok(lock(&self.stats).clone())
    }
}
