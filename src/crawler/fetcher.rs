//! HTTP fetcher implementation
//!
//! This module handles every outbound request of the crawl:
//! - Building the shared HTTP client with the configured user agent
//! - Bounding in-flight requests with a run-wide permit pool
//! - Converting not-found responses and transport failures into [`Absent`]
//!
//! A fetch is attempted exactly once and never returns an error.

use crate::config::{CrawlerConfig, TargetConfig, UserAgentConfig};
use rand::Rng;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Page markup as returned by the server
pub type Markup = String;

/// Why a fetch produced no content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absent {
    /// HTTP 404: the identifier has no page
    NotFound,

    /// Any other non-success status
    Status(u16),

    /// The request exceeded its timeout
    Timeout,

    /// Success status with an empty body
    EmptyBody,

    /// Connection, TLS, or body decoding failure
    Transport(String),
}

impl Absent {
    /// Short label used when tallying outcomes
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Status(_) => "http_status",
            Self::Timeout => "timeout",
            Self::EmptyBody => "empty_body",
            Self::Transport(_) => "transport",
        }
    }
}

impl fmt::Display for Absent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Timeout => write!(f, "request timeout"),
            Self::EmptyBody => write!(f, "empty body"),
            Self::Transport(error) => write!(f, "transport error: {}", error),
        }
    }
}

/// Run-wide pool of fetch permits
///
/// Every request holds one permit from before it is sent until its body has
/// been read. The pool also tracks how many permits are out and the highest
/// number ever out at once.
#[derive(Debug)]
pub struct FetchPermits {
    semaphore: Semaphore,
    limit: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// A held fetch permit; released on drop
#[derive(Debug)]
pub struct FetchPermit<'a> {
    pool: &'a FetchPermits,
    _permit: SemaphorePermit<'a>,
}

impl FetchPermits {
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Semaphore::new(limit),
            limit,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Waits for a free permit
    ///
    /// Returns None only if the pool has been closed.
    pub async fn acquire(&self) -> Option<FetchPermit<'_>> {
        let permit = self.semaphore.acquire().await.ok()?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Some(FetchPermit {
            pool: self,
            _permit: permit,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Permits currently held
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits held at once so far
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Drop for FetchPermit<'_> {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is released
        self.pool.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Builds an HTTP client with proper configuration
///
/// Per-request timeouts are applied by [`Fetcher`]; the client only bounds
/// connection setup.
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages for identifiers under the shared permit pool
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    permits: Arc<FetchPermits>,
    target: TargetConfig,
    timeout: Duration,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl Fetcher {
    pub fn new(
        client: Client,
        permits: Arc<FetchPermits>,
        target: TargetConfig,
        crawler: &CrawlerConfig,
    ) -> Self {
        Self {
            client,
            permits,
            target,
            timeout: Duration::from_secs(crawler.request_timeout_secs),
            min_delay_ms: crawler.min_delay_ms,
            max_delay_ms: crawler.max_delay_ms,
        }
    }

    pub fn permits(&self) -> &Arc<FetchPermits> {
        &self.permits
    }

    pub fn url_for(&self, id: u64) -> String {
        self.target.url_for(id)
    }

    /// Fetches the page for one identifier
    ///
    /// # Outcome Mapping
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx with a body | `Ok(markup)` |
    /// | 2xx, blank body | `Absent::EmptyBody` |
    /// | HTTP 404 | `Absent::NotFound` |
    /// | Other status | `Absent::Status(code)` |
    /// | Timeout | `Absent::Timeout` |
    /// | Connection/TLS/body error | `Absent::Transport` |
    pub async fn fetch(&self, id: u64) -> Result<Markup, Absent> {
        let url = self.target.url_for(id);

        let _permit = self
            .permits
            .acquire()
            .await
            .ok_or_else(|| Absent::Transport("fetch permit pool closed".to_string()))?;

        let result = self.request(&url).await;
        self.pause().await;
        result
    }

    async fn request(&self, url: &str) -> Result<Markup, Absent> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Absent::NotFound);
        }
        if !status.is_success() {
            return Err(Absent::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(classify_error)?;
        if body.trim().is_empty() {
            return Err(Absent::EmptyBody);
        }
        Ok(body)
    }

    /// Politeness pause, taken while the permit is still held
    async fn pause(&self) {
        if self.max_delay_ms == 0 {
            return;
        }
        let millis = rand::thread_rng().gen_range(self.min_delay_ms..=self.max_delay_ms);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

fn classify_error(error: reqwest::Error) -> Absent {
    if error.is_timeout() {
        Absent::Timeout
    } else {
        Absent::Transport(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn crawler_config(timeout_secs: u64) -> CrawlerConfig {
        CrawlerConfig {
            max_concurrent_requests: 4,
            chunk_size: 10,
            request_timeout_secs: timeout_secs,
            connect_timeout_secs: 2,
            min_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    fn user_agent() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
        }
    }

    fn fetcher_for(server: &MockServer, timeout_secs: u64) -> Fetcher {
        let crawler = crawler_config(timeout_secs);
        let client = build_http_client(&user_agent(), &crawler).unwrap();
        let target = TargetConfig {
            base_url: format!("{}/movie/", server.uri()),
            first_id: 1,
            last_id: 10,
        };
        Fetcher::new(client, Arc::new(FetchPermits::new(4)), target, &crawler)
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&user_agent(), &crawler_config(10)).is_ok());
    }

    #[tokio::test]
    async fn test_permits_track_peak() {
        let pool = FetchPermits::new(2);
        {
            let _a = pool.acquire().await.unwrap();
            let _b = pool.acquire().await.unwrap();
            assert_eq!(pool.in_flight(), 2);
        }
        assert_eq!(pool.in_flight(), 0);
        assert_eq!(pool.peak(), 2);
        assert_eq!(pool.limit(), 2);
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, 5);
        assert_eq!(fetcher.fetch(3).await, Ok("<html>ok</html>".to_string()));
        assert_eq!(fetcher.permits().in_flight(), 0);
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, 5);
        assert_eq!(fetcher.fetch(1).await, Err(Absent::NotFound));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, 5);
        assert_eq!(fetcher.fetch(1).await, Err(Absent::Status(503)));
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, 5);
        assert_eq!(fetcher.fetch(1).await, Err(Absent::EmptyBody));
    }

    #[tokio::test]
    async fn test_fetch_timeout_releases_permit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server, 1);
        assert_eq!(fetcher.fetch(1).await, Err(Absent::Timeout));
        assert_eq!(fetcher.permits().in_flight(), 0);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let crawler = crawler_config(2);
        let client = build_http_client(&user_agent(), &crawler).unwrap();
        let target = TargetConfig {
            base_url: "http://127.0.0.1:1/movie/".to_string(),
            first_id: 1,
            last_id: 1,
        };
        let fetcher = Fetcher::new(client, Arc::new(FetchPermits::new(1)), target, &crawler);

        let result = fetcher.fetch(1).await;
        assert!(matches!(
            result,
            Err(Absent::Transport(_)) | Err(Absent::Timeout)
        ));
    }

    #[test]
    fn test_absent_reasons() {
        assert_eq!(Absent::NotFound.reason(), "not_found");
        assert_eq!(Absent::Status(500).reason(), "http_status");
        assert_eq!(Absent::Status(500).to_string(), "HTTP 500");
        assert_eq!(Absent::Timeout.reason(), "timeout");
    }
}
