use std::sync::Arc;

use super::{recommend_backup, GeneralRecommender, PerRecommender, RelateRecommender};
use crate::{
    error::AppResult,
    models::{Post, ScoredPost, User},
    repositories::UserReader,
    services::ranking,
};

/// Blends related posts with personalized posts into one feed
///
/// Both sub-recommenders run concurrently on their own copy of the user; the
/// copies are merged back into the caller's user once both are done.
pub struct HybridRelateRecommender {
    relate_recommender: Arc<dyn RelateRecommender>,
    per_recommender: Arc<dyn PerRecommender>,
    user_reader: Option<Arc<dyn UserReader>>,
    backup_recommender: Option<Arc<dyn GeneralRecommender>>,
}

impl HybridRelateRecommender {
    pub fn new(
        relate_recommender: Arc<dyn RelateRecommender>,
        per_recommender: Arc<dyn PerRecommender>,
        user_reader: Option<Arc<dyn UserReader>>,
        backup_recommender: Option<Arc<dyn GeneralRecommender>>,
    ) -> Self {
        Self {
            relate_recommender,
            per_recommender,
            user_reader,
            backup_recommender,
        }
    }

    async fn refresh_history(&self, user: &mut User) {
        let Some(reader) = &self.user_reader else {
            return;
        };
        match reader.read_user(user.id).await {
            Ok(Some(history)) => user.update(&history),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, user_id = user.id, "Could not refresh user history"),
        }
    }

    async fn try_recommend(
        &self,
        seed_post: &Post,
        user: &mut User,
        limit: usize,
    ) -> AppResult<Option<Vec<ScoredPost>>> {
        self.refresh_history(user).await;

        let relate = Arc::clone(&self.relate_recommender);
        let seed = seed_post.clone();
        let mut relate_user = user.clone();
        let relate_task = tokio::spawn(async move {
            let result = relate.recommend(&seed, &mut relate_user, limit).await;
            (result, relate_user)
        });

        let per = Arc::clone(&self.per_recommender);
        let mut per_user = user.clone();
        let per_task = tokio::spawn(async move {
            let result = per.recommend(&mut per_user, limit).await;
            (result, per_user)
        });

        let (relate_joined, per_joined) = tokio::join!(relate_task, per_task);
        let (related, relate_user) = relate_joined?;
        let (personalized, per_user) = per_joined?;
        user.update(&relate_user);
        user.update(&per_user);

        let related = related.filter(|posts| !posts.is_empty());
        let personalized = personalized.filter(|posts| !posts.is_empty());

        let merged = match (related, personalized) {
            (None, None) => {
                tracing::info!(seed_id = seed_post.id, "Neither related nor personalized posts");
                return Ok(recommend_backup(self.backup_recommender.as_ref(), user, limit).await);
            }
            (Some(mut only), None) | (None, Some(mut only)) => {
                only.truncate(limit);
                only
            }
            (Some(related), Some(personalized)) => ranking::weave(related, personalized, limit),
        };

        Ok(Some(merged))
    }
}

#[async_trait::async_trait]
impl RelateRecommender for HybridRelateRecommender {
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
                tracing::error!(error = %e, "Failed to recommend hybrid posts");
                None
            }
        }
    }
}
