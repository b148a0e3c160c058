//! reqwest implementation of the content API client

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{BackendError, BlogBackend, DynBackend, Envelope};
use crate::config::BackendConfig;
use crate::models::{BlogPage, BlogPost, Category, CurrentUser, DashboardStats, Subscriber, Tag};
use crate::services::editor::BlogSubmission;
use crate::services::listing::BlogQuery;

#[derive(Deserialize)]
struct UserData {
    user: Option<CurrentUser>,
}

#[derive(Deserialize)]
struct BlogData {
    blog: BlogPost,
}

#[derive(Deserialize)]
struct BlogsData {
    #[serde(default)]
    blogs: Vec<BlogPost>,
}

#[derive(Deserialize)]
struct CategoriesData {
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Deserialize)]
struct TagsData {
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Deserialize)]
struct SubscribersData {
    #[serde(default)]
    subscribers: Vec<Subscriber>,
}

#[derive(Deserialize)]
struct StatsData {
    #[serde(default)]
    stats: DashboardStats,
}

/// Content API client over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client with the configured base URL and request timeout
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url().to_string(),
        })
    }

    /// Create a shared client for use with dependency injection
    pub fn shared(config: &BackendConfig) -> Result<DynBackend, BackendError> {
        Ok(Arc::new(Self::new(config)?))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn send_raw<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Envelope<T>, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.error)
                .and_then(|e| e.message);
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        self.send_raw::<T>(request).await?.into_data()
    }

    async fn send_ack(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.send_raw::<serde_json::Value>(request).await?.into_ack()
    }
}

#[async_trait]
impl BlogBackend for HttpBackend {
    async fn current_user(&self, token: &str) -> Result<CurrentUser, BackendError> {
        tracing::debug!("GET /auth/me");
        let request = self.client.get(self.url("/auth/me")).bearer_auth(token);
        let data: UserData = self.send(request).await?;
        data.user
            .ok_or_else(|| BackendError::Decode("missing user".to_string()))
    }

    async fn list_blogs(&self, query: &BlogQuery) -> Result<BlogPage, BackendError> {
        tracing::debug!("GET /blogs {:?}", query);
        let request = self.client.get(self.url("/blogs")).query(&query.to_params());
        self.send(request).await
    }

    async fn get_blog(&self, slug: &str) -> Result<BlogPost, BackendError> {
        let path = format!("/blogs/{}", urlencoding::encode(slug));
        let data: BlogData = self.send(self.client.get(self.url(&path))).await?;
        Ok(data.blog)
    }

    async fn related_blogs(&self, slug: &str, limit: u32) -> Result<Vec<BlogPost>, BackendError> {
        let path = format!("/blogs/{}/related", urlencoding::encode(slug));
        let request = self.client.get(self.url(&path)).query(&[("limit", limit)]);
        let data: BlogsData = self.send(request).await?;
        Ok(data.blogs)
    }

    async fn latest_youtube(&self, limit: u32) -> Result<Vec<BlogPost>, BackendError> {
        let request = self
            .client
            .get(self.url("/blogs/youtube/latest"))
            .query(&[("limit", limit)]);
        let data: BlogsData = self.send(request).await?;
        Ok(data.blogs)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        let data: CategoriesData = self.send(self.client.get(self.url("/categories"))).await?;
        Ok(data.categories)
    }

    async fn list_tags(&self, token: &str) -> Result<Vec<Tag>, BackendError> {
        let request = self.client.get(self.url("/admin/tags")).bearer_auth(token);
        let data: TagsData = self.send(request).await?;
        Ok(data.tags)
    }

    async fn admin_list_blogs(&self, token: &str, query: &BlogQuery) -> Result<BlogPage, BackendError> {
        tracing::debug!("GET /admin/blogs {:?}", query);
        let request = self
            .client
            .get(self.url("/admin/blogs"))
            .bearer_auth(token)
            .query(&query.to_params());
        self.send(request).await
    }

    async fn admin_get_blog(&self, token: &str, id: &str) -> Result<BlogPost, BackendError> {
        let path = format!("/admin/blogs/{}", urlencoding::encode(id));
        let request = self.client.get(self.url(&path)).bearer_auth(token);
        let data: BlogData = self.send(request).await?;
        Ok(data.blog)
    }

    async fn create_blog(&self, token: &str, blog: &BlogSubmission) -> Result<(), BackendError> {
        tracing::debug!("POST /admin/blogs status={}", blog.status);
        let request = self
            .client
            .post(self.url("/admin/blogs"))
            .bearer_auth(token)
            .json(blog);
        self.send_ack(request).await
    }

    async fn update_blog(&self, token: &str, id: &str, blog: &BlogSubmission) -> Result<(), BackendError> {
        tracing::debug!("PUT /admin/blogs/{} status={}", id, blog.status);
        let path = format!("/admin/blogs/{}", urlencoding::encode(id));
        let request = self.client.put(self.url(&path)).bearer_auth(token).json(blog);
        self.send_ack(request).await
    }

    async fn delete_blog(&self, token: &str, id: &str) -> Result<(), BackendError> {
        tracing::debug!("DELETE /admin/blogs/{}", id);
        let path = format!("/admin/blogs/{}", urlencoding::encode(id));
        let request = self.client.delete(self.url(&path)).bearer_auth(token);
        self.send_ack(request).await
    }

    async fn list_subscribers(&self, token: &str) -> Result<Vec<Subscriber>, BackendError> {
        let request = self.client.get(self.url("/admin/subscribers")).bearer_auth(token);
        let data: SubscribersData = self.send(request).await?;
        Ok(data.subscribers)
    }

    async fn dashboard_stats(&self, token: &str) -> Result<DashboardStats, BackendError> {
        let request = self
            .client
            .get(self.url("/admin/dashboard/stats"))
            .bearer_auth(token);
        let data: StatsData = self.send(request).await?;
        Ok(data.stats)
    }
}
