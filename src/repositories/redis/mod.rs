//! Redis-backed score stores
//!
//! Every record is a JSON document stored under a [`StoreKey`]. Records are
//! written by the offline scoring jobs (and by [`RedisUserPostsWriter`] for
//! shown posts); this service only reads them back.
use redis::{AsyncCommands, Client};
use std::fmt::Display;

use crate::{
    error::AppResult,
    models::{PostId, UserId},
};

mod readers;
pub mod records;
mod writer;

pub use readers::{
    RedisGeneralScoreReader, RedisPerScoreReader, RedisRelateScoreReader, RedisUserPostsReader,
    RedisUserReader,
};
pub use writer::RedisUserPostsWriter;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    UserHistory(UserId),
    PerScore(UserId),
    RelateScore(PostId),
    GeneralScore(String),
    ShownPosts(UserId),
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::UserHistory(id) => write!(f, "user:{}:history", id),
            StoreKey::PerScore(id) => write!(f, "per:{}", id),
            StoreKey::RelateScore(id) => write!(f, "relate:{}", id),
            StoreKey::GeneralScore(name) => write!(f, "general:{}", name.to_lowercase()),
            StoreKey::ShownPosts(id) => write!(f, "shown:{}", id),
        }
    }
}

/// Creates a Redis client for the score stores
///
/// Opening a client does not connect; connections are established lazily
/// per read through the multiplexed async connection.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Fetches the raw JSON document stored under `key`
async fn read_raw(client: &Client, key: &StoreKey) -> AppResult<Option<String>> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    let raw: Option<String> = conn.get(key.to_string()).await.map_err(|e| {
        tracing::warn!(error = %e, key = %key, "Redis get failed");
        e
    })?;
    Ok(raw)
}

/// Current unix time in seconds
fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_key_display_user_history() {
        assert_eq!(StoreKey::UserHistory(42).to_string(), "user:42:history");
    }

    #[test]
    fn test_store_key_display_scores() {
        assert_eq!(StoreKey::PerScore(42).to_string(), "per:42");
        assert_eq!(StoreKey::RelateScore(1001).to_string(), "relate:1001");
    }

    #[test]
    fn test_store_key_display_general_score_lowercase() {
        assert_eq!(
            StoreKey::GeneralScore("CTR".to_string()).to_string(),
            "general:ctr"
        );
    }

    #[test]
    fn test_store_key_display_shown_posts() {
        assert_eq!(StoreKey::ShownPosts(7).to_string(), "shown:7");
    }
}
