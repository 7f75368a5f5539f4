use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Post, UserId},
    repositories::UserPostsReader,
};

/// Unions the posts returned by several readers
///
/// A reader that fails or has nothing for the user is skipped; the chain
/// itself never fails.
pub struct ChainUserPostsReader {
    readers: Vec<Arc<dyn UserPostsReader>>,
}

impl ChainUserPostsReader {
    pub fn new(readers: Vec<Arc<dyn UserPostsReader>>) -> Self {
        Self { readers }
    }
}

#[async_trait::async_trait]
impl UserPostsReader for ChainUserPostsReader {
    async fn read_user(&self, user_id: UserId) -> AppResult<Option<Vec<Post>>> {
        let mut seen: HashSet<Post> = HashSet::new();
        let mut result: Vec<Post> = Vec::new();

        for reader in &self.readers {
            match reader.read_user(user_id).await {
                Ok(Some(posts)) => {
                    for post in posts {
                        if seen.insert(post.clone()) {
                            result.push(post);
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, user_id, "User posts reader failed in chain");
                }
            }
        }

        Ok(Some(result))
    }
}
