//! Collaborator contracts the recommenders read from and write to
//!
//! Every reader distinguishes two outcomes: `Ok(None)` when the data is missing
//! or stale, and `Err` when the backing store could not be reached or answered
//! with something unusable. Staleness is decided by the reader, never by the
//! recommenders.
use crate::{
    error::AppResult,
    models::{Post, PostId, ScoredPost, User, UserId},
};

pub mod chain;
pub mod redis;
pub mod retry;

pub use chain::ChainUserPostsReader;
pub use retry::AutoRetry;

/// Reads a user's interaction history
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserReader: Send + Sync {
    /// Returns a user carrying the stored positive/negative history, ready to be
    /// merged into the request's user with [`User::update`]
    async fn read_user(&self, user_id: UserId) -> AppResult<Option<User>>;
}

/// Reads precomputed personalized candidates for a user
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PerScoreReader: Send + Sync {
    /// Candidates in no particular order
    async fn read_user(&self, user_id: UserId) -> AppResult<Option<Vec<ScoredPost>>>;
}

/// Reads precomputed related candidates for a seed post
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RelateScoreReader: Send + Sync {
    async fn read_post(&self, post_id: PostId) -> AppResult<Option<Vec<ScoredPost>>>;
}

/// Reads the global score of every recommendable post
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GeneralScoreReader: Send + Sync {
    /// Each post appears at most once
    async fn read(&self) -> AppResult<Option<Vec<ScoredPost>>>;
}

/// Reads posts tied to a user in some way (recently shown, reported, ...)
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserPostsReader: Send + Sync {
    async fn read_user(&self, user_id: UserId) -> AppResult<Option<Vec<Post>>>;
}

/// Persists posts tied to a user
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserPostsWriter: Send + Sync {
    async fn write(&self, user_id: UserId, posts: Vec<Post>) -> AppResult<()>;
}
