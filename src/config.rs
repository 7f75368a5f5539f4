use serde::Deserialize;

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

/// Which recommender serves the `/relate` endpoint
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RelateMode {
    /// Relate scores only, general scores as backup
    Related,
    /// Relate scores woven with personalized scores
    Hybrid,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL for the score stores
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of posts returned when a request does not specify a limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Largest limit accepted from callers
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Personalized scores older than this many seconds are ignored
    #[serde(default = "default_score_stale_threshold")]
    pub per_stale_threshold: u64,

    /// Relate scores older than this many seconds are ignored
    #[serde(default = "default_score_stale_threshold")]
    pub relate_stale_threshold: u64,

    /// Shown-post records older than this many seconds no longer demote a post
    #[serde(default = "default_excluded_posts_stale_threshold")]
    pub excluded_posts_stale_threshold: u64,

    /// A post must have been shown this many times to be demoted
    #[serde(default = "default_excluded_posts_min_freq")]
    pub excluded_posts_min_freq: usize,

    /// Number of top recommended posts recorded as shown
    #[serde(default = "default_shown_posts_top_k")]
    pub shown_posts_top_k: usize,

    /// Expiry of the shown-posts record in seconds
    #[serde(default = "default_shown_posts_ttl")]
    pub shown_posts_ttl: u64,

    /// Name of the general score record
    #[serde(default = "default_general_score_key")]
    pub general_score_key: String,

    #[serde(default = "default_relate_mode")]
    pub relate_mode: RelateMode,

    /// Attempts made by score readers before giving up
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,

    /// Delay between score reader attempts in milliseconds
    #[serde(default)]
    pub read_retry_delay_ms: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_limit() -> usize {
    6
}

fn default_max_limit() -> usize {
    100
}

fn default_score_stale_threshold() -> u64 {
    3 * DAY
}

fn default_excluded_posts_stale_threshold() -> u64 {
    HOUR
}

fn default_excluded_posts_min_freq() -> usize {
    3
}

fn default_shown_posts_top_k() -> usize {
    6
}

fn default_shown_posts_ttl() -> u64 {
    HOUR
}

fn default_general_score_key() -> String {
    "ctr".to_string()
}

fn default_relate_mode() -> RelateMode {
    RelateMode::Hybrid
}

fn default_read_retries() -> u32 {
    1
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
