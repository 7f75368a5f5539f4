use std::sync::Arc;

use super::{
    read_excluded_posts, read_with_history, recommend_backup, unavailable_as_missing,
    GeneralRecommender, PerRecommender,
};
use crate::{
    error::AppResult,
    models::{ScoredPost, User},
    repositories::{PerScoreReader, UserPostsReader, UserReader},
    services::ranking,
};

/// Recommends from the user's precomputed personalized scores
///
/// Falls back to the backup recommender when the user has no fresh scores.
pub struct ScorePerRecommender {
    user_reader: Option<Arc<dyn UserReader>>,
    per_score_reader: Arc<dyn PerScoreReader>,
    excluded_posts_reader: Option<Arc<dyn UserPostsReader>>,
    backup_recommender: Option<Arc<dyn GeneralRecommender>>,
}

impl ScorePerRecommender {
    pub fn new(
        user_reader: Option<Arc<dyn UserReader>>,
        per_score_reader: Arc<dyn PerScoreReader>,
        excluded_posts_reader: Option<Arc<dyn UserPostsReader>>,
        backup_recommender: Option<Arc<dyn GeneralRecommender>>,
    ) -> Self {
        Self {
            user_reader,
            per_score_reader,
            excluded_posts_reader,
            backup_recommender,
        }
    }

    async fn try_recommend(
        &self,
        user: &mut User,
        limit: usize,
    ) -> AppResult<Option<Vec<ScoredPost>>> {
        let reader = Arc::clone(&self.per_score_reader);
        let user_id = user.id;
        let posts_scores = read_with_history(self.user_reader.as_ref(), user, async move {
            Ok(unavailable_as_missing(
                reader.read_user(user_id).await,
                "per_score",
            ))
        })
        .await?;

        let posts_scores = match posts_scores {
            Some(posts_scores) if !posts_scores.is_empty() => posts_scores,
            _ => {
                tracing::info!(user_id, "No personalized scores");
                return Ok(
                    recommend_backup(self.backup_recommender.as_ref(), user, limit).await,
                );
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
impl PerRecommender for ScorePerRecommender {
    #[tracing::instrument(skip(self, user), fields(user_id = user.id))]
    async fn recommend(&self, user: &mut User, limit: usize) -> Option<Vec<ScoredPost>> {
        match self.try_recommend(user, limit).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Failed to recommend personalized posts");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::Post;
    use crate::repositories::{MockPerScoreReader, MockUserReader};
    use crate::services::recommenders::test_support::{ids, scored};
    use crate::services::recommenders::MockGeneralRecommender;

    fn backup_returning(pairs: &'static [(i64, f64)]) -> Arc<dyn GeneralRecommender> {
        let mut backup = MockGeneralRecommender::new();
        backup
            .expect_recommend()
            .times(1)
            .returning(move |_, _| Some(scored(pairs)));
        Arc::new(backup)
    }

    fn unused_backup() -> Arc<dyn GeneralRecommender> {
        let mut backup = MockGeneralRecommender::new();
        backup.expect_recommend().never();
        Arc::new(backup)
    }

    #[tokio::test]
    async fn test_engaged_post_is_demoted_out_when_limit_is_met() {
        let mut user_reader = MockUserReader::new();
        user_reader.expect_read_user().returning(|user_id| {
            Ok(Some(User::with_history(user_id, vec![Post::new(7)], Vec::new())))
        });

        let mut per_reader = MockPerScoreReader::new();
        per_reader
            .expect_read_user()
            .withf(|user_id| *user_id == 42)
            .returning(|_| Ok(Some(scored(&[(1, 0.9), (7, 0.8), (2, 0.5)]))));

        let recommender = ScorePerRecommender::new(
            Some(Arc::new(user_reader)),
            Arc::new(per_reader),
            None,
            Some(unused_backup()),
        );
        let mut user = User::new(42);

        let result = recommender.recommend(&mut user, 2).await.unwrap();

        assert_eq!(ids(&result), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_missing_scores_fall_back_to_backup() {
        let mut per_reader = MockPerScoreReader::new();
        per_reader.expect_read_user().returning(|_| Ok(None));

        let recommender = ScorePerRecommender::new(
            None,
            Arc::new(per_reader),
            None,
            Some(backup_returning(&[(5, 0.7), (6, 0.6)])),
        );

        let result = recommender.recommend(&mut User::new(42), 2).await.unwrap();

        assert_eq!(ids(&result), vec![5, 6]);
    }

    #[tokio::test]
    async fn test_unreachable_score_source_falls_back_to_backup() {
        let mut per_reader = MockPerScoreReader::new();
        per_reader
            .expect_read_user()
            .returning(|_| Err(AppError::Internal("connection refused".to_string())));

        let recommender = ScorePerRecommender::new(
            None,
            Arc::new(per_reader),
            None,
            Some(backup_returning(&[(5, 0.7)])),
        );

        let result = recommender.recommend(&mut User::new(42), 2).await.unwrap();

        assert_eq!(ids(&result), vec![5]);
    }

    #[tokio::test]
    async fn test_empty_scores_fall_back_to_backup() {
        let mut per_reader = MockPerScoreReader::new();
        per_reader.expect_read_user().returning(|_| Ok(Some(Vec::new())));

        let recommender = ScorePerRecommender::new(
            None,
            Arc::new(per_reader),
            None,
            Some(backup_returning(&[(9, 0.1)])),
        );

        let result = recommender.recommend(&mut User::new(42), 2).await.unwrap();

        assert_eq!(ids(&result), vec![9]);
    }

    #[tokio::test]
    async fn test_missing_scores_without_backup_are_absent() {
        let mut per_reader = MockPerScoreReader::new();
        per_reader.expect_read_user().returning(|_| Ok(None));

        let recommender = ScorePerRecommender::new(None, Arc::new(per_reader), None, None);

        assert!(recommender.recommend(&mut User::new(42), 2).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_history_still_ranks_scores() {
        let mut user_reader = MockUserReader::new();
        user_reader
            .expect_read_user()
            .returning(|_| Err(AppError::Internal("history store unreachable".to_string())));
        let mut per_reader = MockPerScoreReader::new();
        per_reader
            .expect_read_user()
            .returning(|_| Ok(Some(scored(&[(1, 0.9), (2, 0.5)]))));

        let recommender = ScorePerRecommender::new(
            Some(Arc::new(user_reader)),
            Arc::new(per_reader),
            None,
            Some(unused_backup()),
        );

        let result = recommender.recommend(&mut User::new(42), 2).await.unwrap();

        assert_eq!(ids(&result), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_result_never_exceeds_limit() {
        let mut per_reader = MockPerScoreReader::new();
        per_reader.expect_read_user().returning(|_| {
            Ok(Some(
                (1..=50).map(|i| ScoredPost::new(i, i as f64 / 50.0)).collect(),
            ))
        });

        let recommender = ScorePerRecommender::new(None, Arc::new(per_reader), None, None);

        let result = recommender.recommend(&mut User::new(42), 6).await.unwrap();

        assert_eq!(ids(&result), vec![50, 49, 48, 47, 46, 45]);
    }
}
