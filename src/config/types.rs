use serde::Deserialize;

/// Main configuration structure for Reel-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub target: TargetConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub showcase: ShowcaseConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once, across the whole run
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Number of identifiers per chunk (the checkpoint granularity)
    #[serde(rename = "chunk-size")]
    pub chunk_size: u64,

    /// Upper bound on a single request, in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on establishing a connection, in seconds
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Lower bound of the pause taken after each fetch (milliseconds)
    #[serde(rename = "min-delay-ms", default)]
    pub min_delay_ms: u64,

    /// Upper bound of the pause taken after each fetch (milliseconds)
    #[serde(rename = "max-delay-ms", default)]
    pub max_delay_ms: u64,
}

/// The identifier space to walk
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Prefix every identifier is appended to
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// First identifier (inclusive)
    #[serde(rename = "first-id")]
    pub first_id: u64,

    /// Last identifier (inclusive)
    #[serde(rename = "last-id")]
    pub last_id: u64,
}

impl TargetConfig {
    /// Builds the page URL for an identifier
    pub fn url_for(&self, id: u64) -> String {
        format!("{}{}", self.base_url, id)
    }

    /// Number of identifiers in the range
    pub fn len(&self) -> u64 {
        self.last_id.saturating_sub(self.first_id) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.first_id > self.last_id
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving `checkpoint_<n>.csv` files
    #[serde(rename = "checkpoint-dir")]
    pub checkpoint_dir: String,
}

/// Presentation sample configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ShowcaseConfig {
    /// Finished dataset to sample from
    #[serde(rename = "dataset-path", default = "default_dataset_path")]
    pub dataset_path: String,

    /// Image shown for rows without a usable image URL
    #[serde(rename = "placeholder-url", default = "default_placeholder_url")]
    pub placeholder_url: String,

    /// Number of rows to draw
    #[serde(rename = "sample-size", default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            placeholder_url: default_placeholder_url(),
            sample_size: default_sample_size(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_dataset_path() -> String {
    "data/basic_data.csv".to_string()
}

fn default_placeholder_url() -> String {
    "https://critics.io/img/movies/poster-placeholder.png?text=No+image".to_string()
}

fn default_sample_size() -> usize {
    10
}
