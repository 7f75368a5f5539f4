use std::sync::Arc;

use crate::services::{
    recommenders::{PerRecommender, RelateRecommender},
    Recommenders, ShownPostsHandler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub per_recommender: Arc<dyn PerRecommender>,
    pub relate_recommender: Arc<dyn RelateRecommender>,
    pub shown_posts: ShownPostsHandler,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl AppState {
    pub fn new(
        recommenders: Recommenders,
        shown_posts: ShownPostsHandler,
        default_limit: usize,
        max_limit: usize,
    ) -> Self {
        Self {
            per_recommender: recommenders.per,
            relate_recommender: recommenders.relate,
            shown_posts,
            default_limit,
            max_limit,
        }
    }
}
