use std::future::Future;
use std::time::Duration;

use crate::{
    error::AppResult,
    models::{PostId, ScoredPost, UserId},
    repositories::{GeneralScoreReader, PerScoreReader, RelateScoreReader},
};

/// Retries a wrapped reader while it fails
///
/// Only errors are retried. A reader answering `Ok(None)` has found the data
/// missing or stale, and asking again will not change that.
pub struct AutoRetry<R> {
    inner: R,
    num_tries: u32,
    time_between: Option<Duration>,
}

impl<R> AutoRetry<R> {
    /// `num_tries` is clamped to at least one attempt
    pub fn new(inner: R, num_tries: u32, time_between: Option<Duration>) -> Self {
        Self {
            inner,
            num_tries: num_tries.max(1),
            time_between,
        }
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut try_time = 1;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if try_time < self.num_tries => {
                    tracing::warn!(
                        error = %e,
                        operation,
                        attempt = try_time,
                        max_attempts = self.num_tries,
                        "Read failed, retrying"
                    );
                    if let Some(delay) = self.time_between {
                        tokio::time::sleep(delay).await;
                    }
                    try_time += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait::async_trait]
impl<R: PerScoreReader> PerScoreReader for AutoRetry<R> {
    async fn read_user(&self, user_id: UserId) -> AppResult<Option<Vec<ScoredPost>>> {
        self.run("per_score", || self.inner.read_user(user_id)).await
    }
}

#[async_trait::async_trait]
impl<R: RelateScoreReader> RelateScoreReader for AutoRetry<R> {
    async fn read_post(&self, post_id: PostId) -> AppResult<Option<Vec<ScoredPost>>> {
        self.run("relate_score", || self.inner.read_post(post_id)).await
    }
}

#[async_trait::async_trait]
impl<R: GeneralScoreReader> GeneralScoreReader for AutoRetry<R> {
    async fn read(&self) -> AppResult<Option<Vec<ScoredPost>>> {
        self.run("general_score", || self.inner.read()).await
    }
}
