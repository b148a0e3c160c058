//! Listing and browse views
//!
//! This module provides:
//! - `BlogQuery`, the filter/paging parameters shared by public and admin lists
//! - `ListingService` for the public list (TTL cached), blog detail, related
//!   posts, latest videos, categories and the admin table
//! - `InfiniteFeed`, the page-at-a-time feed behind infinite scrolling

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::{BackendError, DynBackend};
use crate::cache::{CacheLayer, MemoryCache};
use crate::models::{BlogPage, BlogPost, BlogStatus, Category, MediaType};
use crate::services::media::{extract_youtube_id, youtube_embed_url};

/// Rows per page in the admin blog table
pub const ADMIN_PAGE_SIZE: u32 = 10;

/// Posts per infinite-scroll page
pub const FEED_PAGE_SIZE: u32 = 10;

pub const RELATED_LIMIT: u32 = 3;

pub const LATEST_VIDEOS_LIMIT: u32 = 3;

/// Cache keys of public blog list pages
pub const BLOG_LIST_KEYS: &str = "blogs:list:*";

// ============================================================================
// Query parameters
// ============================================================================

/// Blog list filters and paging.
///
/// Blank values count as absent and are never sent to the content API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<BlogStatus>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<u32>,
    #[serde(default, deserialize_with = "flag")]
    pub include_drafts: bool,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(matches!(raw.as_deref().map(str::trim), Some("true") | Some("1")))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl BlogQuery {
    /// Admin table query: fixed page size, drafts included, page defaults to 1
    pub fn for_admin(mut self) -> Self {
        self.page = Some(self.page.unwrap_or(1).max(1));
        self.limit = Some(ADMIN_PAGE_SIZE);
        self.include_drafts = true;
        self
    }

    /// Query string pairs in a stable order
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = non_blank(&self.search) {
            params.push(("search", search.to_string()));
        }
        if let Some(category_id) = non_blank(&self.category_id) {
            params.push(("categoryId", category_id.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if self.include_drafts {
            params.push(("includeDrafts", "true".to_string()));
        }
        params
    }

    /// Cache key of the public list page for this query
    pub fn cache_key(&self) -> String {
        let encoded: Vec<String> = self
            .to_params()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(&v)))
            .collect();
        format!("blogs:list:{}", encoded.join("&"))
    }
}

/// Whether `page` is the last one: short or empty, or at the reported page count
pub fn is_last_page(page: &BlogPage, requested_limit: u32) -> bool {
    page.blogs.is_empty()
        || (page.blogs.len() as u32) < requested_limit
        || page.pagination.page >= page.pagination.total_pages
}

// ============================================================================
// View models
// ============================================================================

/// Public blog list page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListView {
    #[serde(flatten)]
    pub page: BlogPage,
    pub has_more: bool,
}

/// Fill in the video id and player URL of a YouTube post
fn attach_player(post: &mut BlogPost) {
    if post.media_type != Some(MediaType::Youtube) {
        return;
    }
    let Some(url) = post.media_url.as_deref() else {
        return;
    };
    if let Some(id) = extract_youtube_id(url) {
        post.youtube_id = Some(id.to_string());
        post.embed_url = Some(youtube_embed_url(url));
    }
}

/// Optional section of posts; hidden when there is nothing to show
#[derive(Debug, Clone, Serialize)]
pub struct BlogSection {
    pub blogs: Vec<BlogPost>,
    pub visible: bool,
}

impl BlogSection {
    fn from_result(result: Result<Vec<BlogPost>, BackendError>, what: &str) -> Self {
        let mut blogs = result.unwrap_or_else(|e| {
            tracing::warn!("Failed to load {}: {}", what, e);
            Vec::new()
        });
        blogs.iter_mut().for_each(attach_player);
        Self {
            visible: !blogs.is_empty(),
            blogs,
        }
    }
}

/// Admin blog table
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBlogTable {
    pub blogs: Vec<BlogPost>,
    pub page: u32,
    pub total_pages: u32,
}

// ============================================================================
// Listing service
// ============================================================================

/// Read side of the content API
pub struct ListingService {
    backend: DynBackend,
    cache: Arc<MemoryCache>,
}

impl ListingService {
    pub fn new(backend: DynBackend, cache: Arc<MemoryCache>) -> Self {
        Self { backend, cache }
    }

    /// Public blog list, served from cache while fresh
    pub async fn public_blogs(&self, query: &BlogQuery) -> Result<BlogListView, BackendError> {
        let key = query.cache_key();
        tracing::debug!("Public blog list {}", key);

        let mut page: BlogPage = self
            .cache
            .get_or_fetch(&key, async { self.backend.list_blogs(query).await })
            .await?;
        page.blogs.iter_mut().for_each(attach_player);

        let has_more = match query.limit {
            Some(limit) => !is_last_page(&page, limit),
            None => page.pagination.page < page.pagination.total_pages,
        };
        Ok(BlogListView { page, has_more })
    }

    /// Drop every cached public list page
    pub async fn invalidate_public_lists(&self) {
        if let Err(e) = self.cache.delete_pattern(BLOG_LIST_KEYS).await {
            tracing::warn!("Failed to invalidate blog list cache: {}", e);
        }
    }

    /// Categories for filters; failures degrade to an empty list
    pub async fn categories(&self) -> Vec<Category> {
        self.backend.list_categories().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to load categories: {}", e);
            Vec::new()
        })
    }

    pub async fn blog_detail(&self, slug: &str) -> Result<BlogPost, BackendError> {
        let mut post = self.backend.get_blog(slug).await?;
        attach_player(&mut post);
        Ok(post)
    }

    pub async fn related(&self, slug: &str) -> BlogSection {
        BlogSection::from_result(
            self.backend.related_blogs(slug, RELATED_LIMIT).await,
            "related blogs",
        )
    }

    pub async fn latest_videos(&self) -> BlogSection {
        BlogSection::from_result(
            self.backend.latest_youtube(LATEST_VIDEOS_LIMIT).await,
            "latest YouTube posts",
        )
    }

    /// Admin blog table for the given filters
    pub async fn admin_blogs(&self, token: &str, query: BlogQuery) -> Result<AdminBlogTable, BackendError> {
        let query = query.for_admin();
        let page = self.backend.admin_list_blogs(token, &query).await.map_err(|e| {
            tracing::error!("Failed to load admin blog list: {}", e);
            e
        })?;

        Ok(AdminBlogTable {
            blogs: page.blogs,
            page: query.page.unwrap_or(1),
            total_pages: page.pagination.total_pages.max(1),
        })
    }
}

// ============================================================================
// Infinite feed
// ============================================================================

/// Outcome of asking the feed for more
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFetch {
    /// A page arrived with this many posts
    Loaded(usize),
    /// A fetch is already running; nothing was requested
    Busy,
    /// The last page has been seen
    Exhausted,
}

#[derive(Debug, Default)]
struct FeedState {
    items: Vec<BlogPost>,
    next_page: u32,
    exhausted: bool,
}

/// Page-at-a-time public blog feed.
///
/// The next page is requested when the last rendered post becomes visible.
/// At most one request is in flight, and a short or empty page ends the feed.
pub struct InfiniteFeed {
    listing: Arc<ListingService>,
    query: BlogQuery,
    state: Mutex<FeedState>,
    loading: AtomicBool,
}

impl InfiniteFeed {
    pub fn new(listing: Arc<ListingService>, query: BlogQuery) -> Self {
        let query = BlogQuery {
            page: None,
            limit: Some(query.limit.unwrap_or(FEED_PAGE_SIZE).max(1)),
            ..query
        };
        Self {
            listing,
            query,
            state: Mutex::new(FeedState {
                next_page: 1,
                ..Default::default()
            }),
            loading: AtomicBool::new(false),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Posts loaded so far
    pub fn items(&self) -> Vec<BlogPost> {
        self.state().items.clone()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state().exhausted
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Called when the last rendered post scrolls into view
    pub async fn on_last_item_visible(&self) -> Result<FeedFetch, BackendError> {
        if self.loading.swap(true, Ordering::AcqRel) {
            return Ok(FeedFetch::Busy);
        }
        // the flag covers both reading and storing the feed state
        let result = self.load_next_page().await;
        self.loading.store(false, Ordering::Release);
        result
    }

    async fn load_next_page(&self) -> Result<FeedFetch, BackendError> {
        let page_number = {
            let state = self.state();
            if state.exhausted {
                return Ok(FeedFetch::Exhausted);
            }
            state.next_page
        };

        let query = BlogQuery {
            page: Some(page_number),
            ..self.query.clone()
        };
        let view = self.listing.public_blogs(&query).await?;
        let limit = self.query.limit.unwrap_or(FEED_PAGE_SIZE);
        let loaded = view.page.blogs.len();

        let mut state = self.state();
        state.exhausted = is_last_page(&view.page, limit);
        state.next_page = page_number + 1;
        state.items.extend(view.page.blogs);

        Ok(if loaded == 0 {
            FeedFetch::Exhausted
        } else {
            FeedFetch::Loaded(loaded)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{blog, FakeBackend};
    use crate::models::Category;
    use std::time::Duration;

    fn posts(n: usize) -> Vec<BlogPost> {
        (1..=n)
            .map(|i| blog(&format!("b{}", i), &format!("Post {}", i), BlogStatus::Published))
            .collect()
    }

    fn service(fake: Arc<FakeBackend>, ttl: Duration) -> ListingService {
        ListingService::new(fake, Arc::new(MemoryCache::with_capacity_and_ttl(100, ttl)))
    }

    #[test]
    fn test_to_params_omits_blank_values() {
        let query = BlogQuery {
            search: Some("  ".to_string()),
            category_id: Some("c1".to_string()),
            status: None,
            page: Some(2),
            limit: None,
            include_drafts: false,
        };
        assert_eq!(
            query.to_params(),
            vec![("categoryId", "c1".to_string()), ("page", "2".to_string())]
        );
    }

    #[test]
    fn test_for_admin_fixes_page_size_and_drafts() {
        let query = BlogQuery {
            status: Some(BlogStatus::Draft),
            ..Default::default()
        }
        .for_admin();

        assert_eq!(
            query.to_params(),
            vec![
                ("status", "DRAFT".to_string()),
                ("page", "1".to_string()),
                ("limit", "10".to_string()),
                ("includeDrafts", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_deserialize_treats_blank_as_absent() {
        let query: BlogQuery = serde_json::from_value(serde_json::json!({
            "search": "",
            "status": "scheduled",
            "page": "3",
            "includeDrafts": "true"
        }))
        .unwrap();

        assert_eq!(query.search, None);
        assert_eq!(query.status, Some(BlogStatus::Scheduled));
        assert_eq!(query.page, Some(3));
        assert!(query.include_drafts);

        let bad = serde_json::from_value::<BlogQuery>(serde_json::json!({ "status": "ARCHIVED" }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_cache_key_encodes_values() {
        let query = BlogQuery {
            search: Some("a&b".to_string()),
            ..Default::default()
        };
        assert_eq!(query.cache_key(), "blogs:list:search=a%26b");
        assert_eq!(BlogQuery::default().cache_key(), "blogs:list:");
    }

    #[tokio::test]
    async fn test_public_list_served_from_cache_until_expiry() {
        let fake = FakeBackend::new().with_blogs(posts(3)).shared();
        let listing = service(fake.clone(), Duration::from_millis(50));
        let query = BlogQuery::default();

        listing.public_blogs(&query).await.unwrap();
        listing.public_blogs(&query).await.unwrap();
        assert_eq!(fake.list_call_count(), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;

        listing.public_blogs(&query).await.unwrap();
        listing.public_blogs(&query).await.unwrap();
        assert_eq!(fake.list_call_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_request() {
        let fake = FakeBackend::new()
            .with_blogs(posts(2))
            .with_list_delay(Duration::from_millis(30))
            .shared();
        let listing = service(fake.clone(), Duration::from_secs(60));
        let query = BlogQuery::default();

        let (a, b, c) = tokio::join!(
            listing.public_blogs(&query),
            listing.public_blogs(&query),
            listing.public_blogs(&query),
        );
        assert_eq!(a.unwrap().page.blogs.len(), 2);
        assert!(b.is_ok() && c.is_ok());
        assert_eq!(fake.list_call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let fake = FakeBackend::new().with_blogs(posts(1)).shared();
        let listing = service(fake.clone(), Duration::from_secs(60));
        let query = BlogQuery::default();

        listing.public_blogs(&query).await.unwrap();
        listing.invalidate_public_lists().await;
        listing.public_blogs(&query).await.unwrap();

        assert_eq!(fake.list_call_count(), 2);
    }

    #[tokio::test]
    async fn test_list_failure_is_not_cached() {
        let fake = FakeBackend::new()
            .with_list_failure(BackendError::Transport("down".into()))
            .shared();
        let listing = service(fake.clone(), Duration::from_secs(60));

        let err = listing.public_blogs(&BlogQuery::default()).await.unwrap_err();
        assert_eq!(err, BackendError::Transport("down".into()));

        listing.public_blogs(&BlogQuery::default()).await.unwrap_err();
        assert_eq!(fake.list_call_count(), 2);
    }

    #[tokio::test]
    async fn test_categories_degrade_to_empty() {
        let fake = FakeBackend::new()
            .with_categories(Err(BackendError::Transport("down".into())))
            .shared();
        assert!(service(fake, Duration::from_secs(1)).categories().await.is_empty());

        let fake = FakeBackend::new()
            .with_categories(Ok(vec![Category {
                id: "c1".into(),
                name: "News".into(),
                slug: "news".into(),
            }]))
            .shared();
        assert_eq!(service(fake, Duration::from_secs(1)).categories().await.len(), 1);
    }

    #[tokio::test]
    async fn test_related_section_hidden_on_failure() {
        let fake = FakeBackend::new()
            .with_blogs(posts(5))
            .with_list_failure(BackendError::Status { status: 500, message: None })
            .shared();
        let section = service(fake, Duration::from_secs(1)).related("b1").await;
        assert!(!section.visible);
        assert!(section.blogs.is_empty());
    }

    #[tokio::test]
    async fn test_related_limited_to_three() {
        let fake = FakeBackend::new().with_blogs(posts(6)).shared();
        let section = service(fake, Duration::from_secs(1)).related("b1").await;
        assert!(section.visible);
        assert_eq!(section.blogs.len(), 3);
        assert!(section.blogs.iter().all(|b| b.slug != "b1"));
    }

    fn video(id: &str, url: &str) -> BlogPost {
        let mut post = blog(id, "Video", BlogStatus::Published);
        post.media_type = Some(MediaType::Youtube);
        post.media_url = Some(url.to_string());
        post
    }

    #[tokio::test]
    async fn test_youtube_posts_carry_player_url() {
        let fake = FakeBackend::new()
            .with_blogs(vec![
                video("v1", "https://youtu.be/dQw4w9WgXcQ"),
                blog("b2", "Plain", BlogStatus::Published),
            ])
            .shared();
        let listing = service(fake, Duration::from_secs(1));

        let detail = listing.blog_detail("v1").await.unwrap();
        assert_eq!(detail.youtube_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            detail.embed_url.as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );

        let videos = listing.latest_videos().await;
        assert_eq!(videos.blogs.len(), 1);
        assert_eq!(videos.blogs[0].youtube_id.as_deref(), Some("dQw4w9WgXcQ"));

        let view = listing.public_blogs(&BlogQuery::default()).await.unwrap();
        let plain = view.page.blogs.iter().find(|b| b.id == "b2").unwrap();
        assert_eq!(plain.embed_url, None);
        let with_video = view.page.blogs.iter().find(|b| b.id == "v1").unwrap();
        assert!(with_video.embed_url.is_some());
    }

    #[tokio::test]
    async fn test_unrecognized_youtube_url_gets_no_player() {
        let fake = FakeBackend::new()
            .with_blogs(vec![video("v1", "https://example.com/clip")])
            .shared();
        let detail = service(fake, Duration::from_secs(1)).blog_detail("v1").await.unwrap();
        assert_eq!(detail.youtube_id, None);
        assert_eq!(detail.embed_url, None);
    }

    #[tokio::test]
    async fn test_admin_table_requests_drafts() {
        let mut blogs = posts(12);
        blogs.push(blog("d1", "Draft", BlogStatus::Draft));
        let fake = FakeBackend::new().with_blogs(blogs).shared();
        let listing = service(fake.clone(), Duration::from_secs(1));

        let table = listing
            .admin_blogs("admin", BlogQuery { page: Some(2), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(table.page, 2);
        assert_eq!(table.total_pages, 2);
        assert_eq!(table.blogs.len(), 3);

        let sent = fake.admin_list_queries.lock().unwrap()[0].clone();
        assert!(sent.include_drafts);
        assert_eq!(sent.limit, Some(ADMIN_PAGE_SIZE));
    }

    #[tokio::test]
    async fn test_feed_pages_until_short_page() {
        let fake = FakeBackend::new().with_blogs(posts(25)).shared();
        let listing = Arc::new(service(fake, Duration::from_secs(60)));
        let feed = InfiniteFeed::new(listing, BlogQuery::default());

        assert_eq!(feed.on_last_item_visible().await.unwrap(), FeedFetch::Loaded(10));
        assert_eq!(feed.on_last_item_visible().await.unwrap(), FeedFetch::Loaded(10));
        assert!(!feed.is_exhausted());
        assert_eq!(feed.on_last_item_visible().await.unwrap(), FeedFetch::Loaded(5));
        assert!(feed.is_exhausted());
        assert_eq!(feed.on_last_item_visible().await.unwrap(), FeedFetch::Exhausted);

        let items = feed.items();
        assert_eq!(items.len(), 25);
        assert_eq!(items[24].id, "b25");
    }

    #[tokio::test]
    async fn test_feed_ignores_duplicate_trigger_while_loading() {
        let fake = FakeBackend::new()
            .with_blogs(posts(30))
            .with_list_delay(Duration::from_millis(30))
            .shared();
        let listing = Arc::new(service(fake.clone(), Duration::from_secs(60)));
        let feed = InfiniteFeed::new(listing, BlogQuery::default());

        let (first, second) = tokio::join!(feed.on_last_item_visible(), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            feed.on_last_item_visible().await
        });

        assert_eq!(first.unwrap(), FeedFetch::Loaded(10));
        assert_eq!(second.unwrap(), FeedFetch::Busy);
        assert_eq!(feed.items().len(), 10);
        assert_eq!(fake.list_call_count(), 1);
        assert!(!feed.is_loading());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_feed_concurrent_triggers_never_duplicate_posts() {
        let fake = FakeBackend::new().with_blogs(posts(45)).shared();
        let listing = Arc::new(service(fake, Duration::from_secs(60)));
        let feed = Arc::new(InfiniteFeed::new(listing, BlogQuery::default()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let feed = feed.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..50 {
                    feed.on_last_item_visible().await.unwrap();
                    tokio::task::yield_now().await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // finish any page a trigger skipped as busy
        while !feed.is_exhausted() {
            feed.on_last_item_visible().await.unwrap();
        }

        let ids: Vec<String> = feed.items().into_iter().map(|b| b.id).collect();
        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(ids.len(), 45);
        assert_eq!(unique.len(), 45);
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn test_feed_with_no_posts_is_exhausted() {
        let fake = FakeBackend::new().shared();
        let listing = Arc::new(service(fake, Duration::from_secs(60)));
        let feed = InfiniteFeed::new(listing, BlogQuery::default());

        assert_eq!(feed.on_last_item_visible().await.unwrap(), FeedFetch::Exhausted);
        assert!(feed.is_exhausted());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(30))]

            #[test]
            fn params_never_contain_blank_values(
                search in proptest::option::of("[ a-z]{0,6}"),
                category in proptest::option::of("[ a-z0-9]{0,6}"),
                page in proptest::option::of(1u32..50),
                drafts in any::<bool>(),
            ) {
                let query = BlogQuery {
                    search,
                    category_id: category,
                    status: None,
                    page,
                    limit: None,
                    include_drafts: drafts,
                };
                let params = query.to_params();
                prop_assert!(params.iter().all(|(_, v)| !v.trim().is_empty()));
                prop_assert_eq!(params.iter().any(|(k, _)| *k == "includeDrafts"), drafts);
            }
        }
    }
}
