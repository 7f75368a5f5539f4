use std::sync::Arc;

use super::{read_excluded_posts, read_with_history, GeneralRecommender};
use crate::{
    error::AppResult,
    models::{ScoredPost, User},
    repositories::{GeneralScoreReader, UserPostsReader, UserReader},
    services::ranking,
};

/// Recommends the globally best scored posts, demoting what the user already saw
pub struct ScoreGeneralRecommender {
    user_reader: Option<Arc<dyn UserReader>>,
    general_score_reader: Arc<dyn GeneralScoreReader>,
    excluded_posts_reader: Option<Arc<dyn UserPostsReader>>,
}

impl ScoreGeneralRecommender {
    pub fn new(
        user_reader: Option<Arc<dyn UserReader>>,
        general_score_reader: Arc<dyn GeneralScoreReader>,
        excluded_posts_reader: Option<Arc<dyn UserPostsReader>>,
    ) -> Self {
        Self {
            user_reader,
            general_score_reader,
            excluded_posts_reader,
        }
    }

    async fn try_recommend(
        &self,
        user: &mut User,
        limit: usize,
    ) -> AppResult<Option<Vec<ScoredPost>>> {
        let reader = Arc::clone(&self.general_score_reader);
        let posts_scores =
            read_with_history(self.user_reader.as_ref(), user, async move { reader.read().await })
                .await?;

        let posts_scores = match posts_scores {
            Some(posts_scores) if !posts_scores.is_empty() => posts_scores,
            _ => {
                tracing::warn!(user_id = user.id, "No general scores available");
                return Ok(None);
            }
        };

        let excluded = read_excluded_posts(self.excluded_posts_reader.as_ref(), user).await?;
        Ok(Some(ranking::rank_with_exclusion(
            posts_scores,
            &excluded,
            limit,
        )))
    }
}

#[async_trait::async_trait]
impl GeneralRecommender for ScoreGeneralRecommender {
    #[tracing::instrument(skip(self, user), fields(user_id = user.id))]
    async fn recommend(&self, user: &mut User, limit: usize) -> Option<Vec<ScoredPost>> {
        match self.try_recommend(user, limit).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Failed to recommend general posts");
                None
            }
        }
    }
}
