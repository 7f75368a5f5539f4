use std::sync::Arc;

use super::{
    read_excluded_posts, read_with_history, recommend_backup, unavailable_as_missing,
    GeneralRecommender, RelateRecommender,
};
use crate::{
    error::AppResult,
    models::{Post, ScoredPost, User},
    repositories::{RelateScoreReader, UserPostsReader, UserReader},
    services::ranking,
};

/// Recommends posts related to a seed post from precomputed relate scores
pub struct ScoreRelateRecommender {
    user_reader: Option<Arc<dyn UserReader>>,
    relate_score_reader: Arc<dyn RelateScoreReader>,
    excluded_posts_reader: Option<Arc<dyn UserPostsReader>>,
    backup_recommender: Option<Arc<dyn GeneralRecommender>>,
}

impl ScoreRelateRecommender {
    pub fn new(
        user_reader: Option<Arc<dyn UserReader>>,
        relate_score_reader: Arc<dyn RelateScoreReader>,
        excluded_posts_reader: Option<Arc<dyn UserPostsReader>>,
        backup_recommender: Option<Arc<dyn GeneralRecommender>>,
    ) -> Self {
        Self {
            user_reader,
            relate_score_reader,
            excluded_posts_reader,
            backup_recommender,
        }
    }

    async fn try_recommend(
        &self,
        seed_post: &Post,
        user: &mut User,
        limit: usize,
    ) -> AppResult<Option<Vec<ScoredPost>>> {
        let reader = Arc::clone(&self.relate_score_reader);
        let seed_id = seed_post.id;
        let posts_scores = read_with_history(self.user_reader.as_ref(), user, async move {
            Ok(unavailable_as_missing(
                reader.read_post(seed_id).await,
                "relate_score",
            ))
        })
        .await?;

        let Some(mut posts_scores) = posts_scores.filter(|posts| !posts.is_empty()) else {
            tracing::info!(seed_id, "No relate scores for seed post");
            return Ok(recommend_backup(self.backup_recommender.as_ref(), user, limit).await);
        };

        // A post is never related to itself
        posts_scores.retain(|candidate| candidate.post_id() != seed_id);

        let excluded = read_excluded_posts(self.excluded_posts_reader.as_ref(), user).await?;
        Ok(Some(ranking::rank_with_exclusion(
            posts_scores,
            &excluded,
            limit,
        )))
    }
}

#[async_trait::async_trait]
impl RelateRecommender for ScoreRelateRecommender {
    #[tracing::instrument(skip(self, seed_post, user), fields(seed_id = seed_post.id, user_id = user.id))]
    async fn recommend(
        &self,
        seed_post: &Post,
        user: &mut User,
        limit: usize,
    ) -> Option<Vec<ScoredPost>> {
        match self.try_recommend(seed_post, user, limit).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Failed to recommend related posts");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::repositories::{MockRelateScoreReader, MockUserPostsReader};
    use crate::services::recommenders::test_support::{ids, scored};
    use crate::services::recommenders::MockGeneralRecommender;

    fn relate_reader(pairs: &'static [(i64, f64)]) -> Arc<dyn RelateScoreReader> {
        let mut reader = MockRelateScoreReader::new();
        reader
            .expect_read_post()
            .withf(|post_id| *post_id == 10)
            .returning(move |_| Ok(Some(scored(pairs))));
        Arc::new(reader)
    }

    #[tokio::test]
    async fn test_seed_post_is_never_recommended() {
        let recommender = ScoreRelateRecommender::new(
            None,
            relate_reader(&[(10, 1.0), (11, 0.9), (12, 0.3)]),
            None,
            None,
        );

        let result = recommender
            .recommend(&Post::new(10), &mut User::new(42), 5)
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![11, 12]);
    }

    #[tokio::test]
    async fn test_seed_only_candidates_give_empty_list() {
        let recommender = ScoreRelateRecommender::new(None, relate_reader(&[(10, 1.0)]), None, None);

        let result = recommender
            .recommend(&Post::new(10), &mut User::new(42), 5)
            .await;

        assert_eq!(result, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_recently_shown_posts_pad_the_tail() {
        let mut shown_reader = MockUserPostsReader::new();
        shown_reader
            .expect_read_user()
            .returning(|_| Ok(Some(vec![Post::new(11)])));

        let recommender = ScoreRelateRecommender::new(
            None,
            relate_reader(&[(11, 0.9), (12, 0.3), (13, 0.2)]),
            Some(Arc::new(shown_reader)),
            None,
        );

        let result = recommender
            .recommend(&Post::new(10), &mut User::new(42), 3)
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![12, 13, 11]);
    }

    #[tokio::test]
    async fn test_stale_scores_fall_back_to_backup() {
        let mut reader = MockRelateScoreReader::new();
        reader.expect_read_post().returning(|_| Ok(None));
        let mut backup = MockGeneralRecommender::new();
        backup
            .expect_recommend()
            .times(1)
            .returning(|_, limit| Some(scored(&[(1, 0.5), (2, 0.4), (3, 0.3)])[..limit].to_vec()));

        let recommender =
            ScoreRelateRecommender::new(None, Arc::new(reader), None, Some(Arc::new(backup)));

        let result = recommender
            .recommend(&Post::new(10), &mut User::new(42), 2)
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_failing_source_and_backup_are_absent() {
        let mut reader = MockRelateScoreReader::new();
        reader
            .expect_read_post()
            .returning(|_| Err(AppError::Internal("timeout".to_string())));
        let mut backup = MockGeneralRecommender::new();
        backup.expect_recommend().returning(|_, _| None);

        let recommender =
            ScoreRelateRecommender::new(None, Arc::new(reader), None, Some(Arc::new(backup)));

        let result = recommender
            .recommend(&Post::new(10), &mut User::new(42), 2)
            .await;

        assert!(result.is_none());
    }
}
