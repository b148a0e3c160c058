//! Integration checks against the content API
//!
//! Used by the `check-integration` binary. A check passes when the API
//! answers with any status below 500; auth failures on the dummy token still
//! prove the route is mounted.

use std::time::Duration;

/// Timeout for each check
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// One fixed probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationCheck {
    pub name: &'static str,
    pub path: &'static str,
    pub bearer: Option<&'static str>,
}

/// The probes run by `check-integration`, in order
pub const INTEGRATION_CHECKS: [IntegrationCheck; 3] = [
    IntegrationCheck {
        name: "Backend Health Check",
        path: "/health",
        bearer: None,
    },
    IntegrationCheck {
        name: "Backend Auth Routes",
        path: "/api/v1/auth/me",
        bearer: Some("test-token"),
    },
    IntegrationCheck {
        name: "Backend Blog Routes (Public)",
        path: "/api/v1/blogs",
        bearer: None,
    },
];

/// Result of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub url: String,
    /// HTTP status, absent when the request itself failed
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        matches!(self.status, Some(status) if status < 500)
    }
}

/// Build the client used for the checks
pub fn check_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("techzone-check-integration")
        .timeout(CHECK_TIMEOUT)
        .build()
}

async fn run_check(client: &reqwest::Client, base_url: &str, check: &IntegrationCheck) -> CheckResult {
    let url = format!("{}{}", base_url.trim_end_matches('/'), check.path);
    let mut request = client.get(&url);
    if let Some(token) = check.bearer {
        request = request.bearer_auth(token);
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            tracing::debug!("{} -> {}", url, status);
            CheckResult {
                name: check.name,
                url,
                status: Some(status),
                error: None,
            }
        }
        Err(e) => CheckResult {
            name: check.name,
            url,
            status: None,
            error: Some(e.to_string()),
        },
    }
}

/// Run every check sequentially
pub async fn run_checks(client: &reqwest::Client, base_url: &str) -> Vec<CheckResult> {
    let mut results = Vec::with_capacity(INTEGRATION_CHECKS.len());
    for check in &INTEGRATION_CHECKS {
        results.push(run_check(client, base_url, check).await);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn me(headers: HeaderMap) -> StatusCode {
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer test-token") => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    #[tokio::test]
    async fn test_statuses_below_500_pass() {
        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/api/v1/auth/me", get(me))
            .route("/api/v1/blogs", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let base = spawn(app).await;

        let results = run_checks(&check_client().unwrap(), &format!("{}/", base)).await;
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].status, Some(200));
        assert!(results[0].passed());
        // dummy bearer was forwarded
        assert_eq!(results[1].status, Some(401));
        assert!(results[1].passed());
        assert_eq!(results[2].url, format!("{}/api/v1/blogs", base));
        assert!(!results[2].passed());
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_every_check() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let results = run_checks(&check_client().unwrap(), &format!("http://{}", addr)).await;
        assert!(results.iter().all(|r| !r.passed() && r.error.is_some()));
    }

    #[test]
    fn test_check_names() {
        let names: Vec<&str> = INTEGRATION_CHECKS.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            ["Backend Health Check", "Backend Auth Routes", "Backend Blog Routes (Public)"]
        );
    }
}
