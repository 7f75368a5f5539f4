use redis::Client;

use super::{now_timestamp, read_raw, records, StoreKey};
use crate::{
    error::AppResult,
    models::{Post, PostId, ScoredPost, User, UserId},
    repositories::{
        GeneralScoreReader, PerScoreReader, RelateScoreReader, UserPostsReader, UserReader,
    },
};

/// Reads user history stored by the interaction pipeline
#[derive(Clone)]
pub struct RedisUserReader {
    client: Client,
}

impl RedisUserReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl UserReader for RedisUserReader {
    async fn read_user(&self, user_id: UserId) -> AppResult<Option<User>> {
        let Some(raw) = read_raw(&self.client, &StoreKey::UserHistory(user_id)).await? else {
            tracing::debug!(user_id, "No stored history");
            return Ok(None);
        };

        Ok(records::parse_history_record(&raw, user_id))
    }
}

/// Reads personalized scores, ignoring records older than `stale_threshold` seconds
#[derive(Clone)]
pub struct RedisPerScoreReader {
    client: Client,
    stale_threshold: u64,
}

impl RedisPerScoreReader {
    pub fn new(client: Client, stale_threshold: u64) -> Self {
        Self {
            client,
            stale_threshold,
        }
    }
}

#[async_trait::async_trait]
impl PerScoreReader for RedisPerScoreReader {
    async fn read_user(&self, user_id: UserId) -> AppResult<Option<Vec<ScoredPost>>> {
        let Some(raw) = read_raw(&self.client, &StoreKey::PerScore(user_id)).await? else {
            return Ok(None);
        };

        let posts_scores =
            records::parse_score_record(&raw, now_timestamp(), self.stale_threshold);

        tracing::debug!(
            user_id,
            found = ?posts_scores.as_ref().map(Vec::len),
            "Read personalized scores"
        );

        Ok(posts_scores)
    }
}

/// Reads relate scores, ignoring records older than `stale_threshold` seconds
#[derive(Clone)]
pub struct RedisRelateScoreReader {
    client: Client,
    stale_threshold: u64,
}

impl RedisRelateScoreReader {
    pub fn new(client: Client, stale_threshold: u64) -> Self {
        Self {
            client,
            stale_threshold,
        }
    }
}

#[async_trait::async_trait]
impl RelateScoreReader for RedisRelateScoreReader {
    async fn read_post(&self, post_id: PostId) -> AppResult<Option<Vec<ScoredPost>>> {
        let Some(raw) = read_raw(&self.client, &StoreKey::RelateScore(post_id)).await? else {
            return Ok(None);
        };

        let posts_scores =
            records::parse_score_record(&raw, now_timestamp(), self.stale_threshold);

        tracing::debug!(
            post_id,
            found = ?posts_scores.as_ref().map(Vec::len),
            "Read relate scores"
        );

        Ok(posts_scores)
    }
}

/// Reads one named global score record (click-through rate, trending, ...)
#[derive(Clone)]
pub struct RedisGeneralScoreReader {
    client: Client,
    name: String,
}

impl RedisGeneralScoreReader {
    pub fn new(client: Client, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }
}

#[async_trait::async_trait]
impl GeneralScoreReader for RedisGeneralScoreReader {
    async fn read(&self) -> AppResult<Option<Vec<ScoredPost>>> {
        let key = StoreKey::GeneralScore(self.name.clone());
        let Some(raw) = read_raw(&self.client, &key).await? else {
            tracing::warn!(key = %key, "General score record missing");
            return Ok(None);
        };

        Ok(records::parse_general_record(&raw))
    }
}

/// Reads posts recently shown to a user often enough to be demoted
#[derive(Clone)]
pub struct RedisUserPostsReader {
    client: Client,
    stale_threshold: u64,
    min_freq: usize,
}

impl RedisUserPostsReader {
    pub fn new(client: Client, stale_threshold: u64, min_freq: usize) -> Self {
        Self {
            client,
            stale_threshold,
            min_freq,
        }
    }
}

#[async_trait::async_trait]
impl UserPostsReader for RedisUserPostsReader {
    async fn read_user(&self, user_id: UserId) -> AppResult<Option<Vec<Post>>> {
        let Some(raw) = read_raw(&self.client, &StoreKey::ShownPosts(user_id)).await? else {
            return Ok(None);
        };

        let entries = records::parse_shown_entries(&raw);
        let posts = records::frequent_shown_posts(
            &entries,
            now_timestamp(),
            self.stale_threshold,
            self.min_freq,
        );

        Ok(Some(posts))
    }
}
