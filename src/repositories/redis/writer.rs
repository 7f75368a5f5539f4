use redis::{AsyncCommands, Client};

use super::{now_timestamp, read_raw, records, StoreKey};
use crate::{
    error::AppResult,
    models::{Post, UserId},
    repositories::UserPostsWriter,
};

/// Records posts shown to a user
///
/// Each write prepends the new posts stamped with the current time, keeps the
/// old entries still inside the freshness window and resets the record expiry.
#[derive(Clone)]
pub struct RedisUserPostsWriter {
    client: Client,
    time_to_live: u64,
    stale_threshold: u64,
}

impl RedisUserPostsWriter {
    pub fn new(client: Client, time_to_live: u64, stale_threshold: u64) -> Self {
        Self {
            client,
            time_to_live,
            stale_threshold,
        }
    }
}

#[async_trait::async_trait]
impl UserPostsWriter for RedisUserPostsWriter {
    async fn write(&self, user_id: UserId, posts: Vec<Post>) -> AppResult<()> {
        let key = StoreKey::ShownPosts(user_id);

        let old_entries = read_raw(&self.client, &key)
            .await?
            .map(|raw| records::parse_shown_entries(&raw))
            .unwrap_or_default();

        let entries =
            records::merge_shown_entries(&posts, old_entries, now_timestamp(), self.stale_threshold);
        let record = serde_json::to_string(&serde_json::json!({ "data": &entries }))?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(key.to_string(), record, self.time_to_live)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Redis set failed");
                e
            })?;

        tracing::debug!(
            user_id,
            written = posts.len(),
            total = entries.len(),
            ttl = self.time_to_live,
            "Recorded shown posts"
        );

        Ok(())
    }
}
