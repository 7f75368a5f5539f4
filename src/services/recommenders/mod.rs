//! Recommenders and the read plumbing they share
//!
//! Every recommender answers with `Option<Vec<ScoredPost>>` and never fails:
//! errors are logged where they happen and turn into `None`. Callers only need
//! to check for absence.
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use crate::{
    config::RelateMode,
    error::AppResult,
    models::{Post, ScoredPost, User},
    repositories::{UserPostsReader, UserReader},
};

mod general;
mod hybrid;
mod personalized;
mod related;

pub use general::ScoreGeneralRecommender;
pub use hybrid::HybridRelateRecommender;
pub use personalized::ScorePerRecommender;
pub use related::ScoreRelateRecommender;

/// Ranks posts from a global score, with no per-user model
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GeneralRecommender: Send + Sync {
    async fn recommend(&self, user: &mut User, limit: usize) -> Option<Vec<ScoredPost>>;
}

/// Ranks posts for a user
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PerRecommender: Send + Sync {
    async fn recommend(&self, user: &mut User, limit: usize) -> Option<Vec<ScoredPost>>;
}

/// Ranks posts related to a seed post, for a user
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RelateRecommender: Send + Sync {
    async fn recommend(
        &self,
        seed_post: &Post,
        user: &mut User,
        limit: usize,
    ) -> Option<Vec<ScoredPost>>;
}

/// Picks the recommender serving related requests
pub fn relate_recommender_for(
    mode: RelateMode,
    related: Arc<dyn RelateRecommender>,
    per_recommender: Arc<dyn PerRecommender>,
    user_reader: Option<Arc<dyn UserReader>>,
    backup_recommender: Option<Arc<dyn GeneralRecommender>>,
) -> Arc<dyn RelateRecommender> {
    match mode {
        RelateMode::Related => related,
        RelateMode::Hybrid => Arc::new(HybridRelateRecommender::new(
            related,
            per_recommender,
            user_reader,
            backup_recommender,
        )),
    }
}

/// Reads the user's history and the candidate scores side by side
///
/// Both reads run as separate tasks and are always awaited to completion before
/// returning. The fetched history is merged into `user`; a failed history read
/// is logged and the user keeps the history it already had. Without a history
/// reader only the scores are read.
pub(crate) async fn read_with_history<T, F>(
    user_reader: Option<&Arc<dyn UserReader>>,
    user: &mut User,
    scores: F,
) -> AppResult<T>
where
    T: Send + 'static,
    F: Future<Output = AppResult<T>> + Send + 'static,
{
    let Some(reader) = user_reader else {
        return scores.await;
    };

    let reader = Arc::clone(reader);
    let user_id = user.id;
    let history_task = tokio::spawn(async move { reader.read_user(user_id).await });
    let scores_task = tokio::spawn(scores);

    let (history, scores) = tokio::join!(history_task, scores_task);

    match history? {
        Ok(Some(history)) => user.update(&history),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, user_id, "User history unavailable, ranking without it");
        }
    }
    scores?
}

/// Treats a failed score source like a missing one, so the caller falls back
pub(crate) fn unavailable_as_missing<T>(result: AppResult<Option<T>>, source: &str) -> Option<T> {
    match result {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, source, "Score source unavailable");
            None
        }
    }
}

/// The user's positive history plus whatever the excluded-posts reader returns
pub(crate) async fn read_excluded_posts(
    reader: Option<&Arc<dyn UserPostsReader>>,
    user: &User,
) -> AppResult<HashSet<Post>> {
    let extra = match reader {
        Some(reader) => reader.read_user(user.id).await?,
        None => None,
    };
    Ok(super::ranking::excluded_posts(user, extra))
}

/// Hands the request to the backup recommender, if one is configured
pub(crate) async fn recommend_backup(
    backup: Option<&Arc<dyn GeneralRecommender>>,
    user: &mut User,
    limit: usize,
) -> Option<Vec<ScoredPost>> {
    match backup {
        Some(backup) => {
            tracing::info!(user_id = user.id, "Falling back to general recommendations");
            backup.recommend(user, limit).await
        }
        None => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{PostId, ScoredPost};

    pub fn scored(pairs: &[(PostId, f64)]) -> Vec<ScoredPost> {
        pairs
            .iter()
            .map(|&(id, score)| ScoredPost::new(id, score))
            .collect()
    }

    pub fn ids(posts: &[ScoredPost]) -> Vec<PostId> {
        posts.iter().map(ScoredPost::post_id).collect()
    }
}
