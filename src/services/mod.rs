pub mod ranking;
pub mod recommenders;
pub mod shown_posts;

use std::sync::Arc;
use std::time::Duration;

use redis::Client;

use crate::{
    config::Config,
    repositories::{
        redis::{
            RedisGeneralScoreReader, RedisPerScoreReader, RedisRelateScoreReader,
            RedisUserPostsReader, RedisUserPostsWriter, RedisUserReader,
        },
        AutoRetry, ChainUserPostsReader, UserPostsReader, UserPostsWriter, UserReader,
    },
};
use recommenders::{
    GeneralRecommender, PerRecommender, RelateRecommender, ScoreGeneralRecommender,
    ScorePerRecommender, ScoreRelateRecommender,
};

pub use shown_posts::{ShownPostsHandler, ShownPostsWriterHandle};

/// Recommenders serving the HTTP endpoints
pub struct Recommenders {
    pub per: Arc<dyn PerRecommender>,
    pub relate: Arc<dyn RelateRecommender>,
}

/// Wires the Redis-backed recommenders described by `config`
pub fn build_recommenders(config: &Config, client: &Client) -> Recommenders {
    let retry_delay = (config.read_retry_delay_ms > 0)
        .then(|| Duration::from_millis(config.read_retry_delay_ms));

    let user_reader: Arc<dyn UserReader> = Arc::new(RedisUserReader::new(client.clone()));
    let shown_posts_reader: Arc<dyn UserPostsReader> = Arc::new(RedisUserPostsReader::new(
        client.clone(),
        config.excluded_posts_stale_threshold,
        config.excluded_posts_min_freq,
    ));
    let excluded_posts_reader: Arc<dyn UserPostsReader> =
        Arc::new(ChainUserPostsReader::new(vec![shown_posts_reader]));

    let general: Arc<dyn GeneralRecommender> = Arc::new(ScoreGeneralRecommender::new(
        Some(Arc::clone(&user_reader)),
        Arc::new(AutoRetry::new(
            RedisGeneralScoreReader::new(client.clone(), config.general_score_key.clone()),
            config.read_retries,
            retry_delay,
        )),
        Some(Arc::clone(&excluded_posts_reader)),
    ));

    let per: Arc<dyn PerRecommender> = Arc::new(ScorePerRecommender::new(
        Some(Arc::clone(&user_reader)),
        Arc::new(AutoRetry::new(
            RedisPerScoreReader::new(client.clone(), config.per_stale_threshold),
            config.read_retries,
            retry_delay,
        )),
        Some(Arc::clone(&excluded_posts_reader)),
        Some(Arc::clone(&general)),
    ));

    let related: Arc<dyn RelateRecommender> = Arc::new(ScoreRelateRecommender::new(
        Some(Arc::clone(&user_reader)),
        Arc::new(AutoRetry::new(
            RedisRelateScoreReader::new(client.clone(), config.relate_stale_threshold),
            config.read_retries,
            retry_delay,
        )),
        Some(excluded_posts_reader),
        Some(Arc::clone(&general)),
    ));

    let relate = recommenders::relate_recommender_for(
        config.relate_mode,
        related,
        Arc::clone(&per),
        Some(user_reader),
        Some(general),
    );

    tracing::info!(relate_mode = ?config.relate_mode, "Recommenders ready");

    Recommenders { per, relate }
}

/// Creates the shown-posts handler backed by Redis
pub fn build_shown_posts_handler(
    config: &Config,
    client: &Client,
) -> (ShownPostsHandler, ShownPostsWriterHandle) {
    let writer: Arc<dyn UserPostsWriter> = Arc::new(RedisUserPostsWriter::new(
        client.clone(),
        config.shown_posts_ttl,
        config.excluded_posts_stale_threshold,
    ));
    ShownPostsHandler::new(writer, config.shown_posts_top_k)
}
