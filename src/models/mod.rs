use serde::{Deserialize, Serialize};

mod encode;
mod post;
mod user;

pub use encode::Encode;
pub use post::{Post, PostId};
pub use user::{User, UserId};

/// A candidate post with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPost {
    pub post: Post,
    pub score: f64,
}

impl ScoredPost {
    pub fn new(post: impl Into<Post>, score: f64) -> Self {
        Self {
            post: post.into(),
            score,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post.id
    }
}

// ============================================================================
// HTTP API Types
// ============================================================================

pub const SUCCESS_MESSAGE: &str = "Recommend successfully";
pub const FAILURE_MESSAGE: &str = "Failed to get recommendation";

/// Query for the personalized endpoint
#[derive(Debug, Deserialize)]
pub struct PerQuery {
    pub user_id: UserId,
    pub limit: Option<usize>,
}

/// Query for the related endpoint
#[derive(Debug, Deserialize)]
pub struct RelateQuery {
    pub user_id: UserId,
    pub seed_post_id: PostId,
    pub limit: Option<usize>,
}

/// A single recommended post as returned to clients
///
/// Ids are rendered as strings so that JavaScript clients keep full precision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedItem {
    pub id: String,
    pub score: f64,
}

impl From<&ScoredPost> for RecommendedItem {
    fn from(scored: &ScoredPost) -> Self {
        Self {
            id: scored.post.id.to_string(),
            score: scored.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendResponse {
    pub message: String,
    pub recommend: Vec<RecommendedItem>,
}

impl RecommendResponse {
    /// Builds the response body, treating an absent or empty result as a soft failure
    pub fn from_result(result: Option<&[ScoredPost]>) -> Self {
        match result {
            Some(posts) if !posts.is_empty() => Self {
                message: SUCCESS_MESSAGE.to_string(),
                recommend: posts.iter().map(RecommendedItem::from).collect(),
            },
            _ => Self {
                message: FAILURE_MESSAGE.to_string(),
                recommend: Vec::new(),
            },
        }
    }
}
