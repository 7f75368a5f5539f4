//! JSON record formats kept in the score stores
//!
//! Parsing is lenient at the entry level: a malformed entry is skipped, while a
//! record that cannot be read at all is reported as missing.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::models::{Post, PostId, ScoredPost, User, UserId};

/// Scores computed for one key at a given time
///
/// `result` holds `[post_id, score]` pairs.
#[derive(Debug, Deserialize, Serialize)]
pub struct ScoreRecord {
    pub timestamp: i64,
    pub result: Vec<Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GeneralScoreRecord {
    pub data: Vec<Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub positive: Vec<PostId>,
    #[serde(default)]
    pub negative: Vec<PostId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShownEntry {
    #[serde(deserialize_with = "de_post_id")]
    pub post_id: PostId,
    pub timestamp: i64,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ShownPostsRecord {
    #[serde(default)]
    pub data: Vec<Value>,
}

/// Post ids are written as numbers by newer jobs and as digit strings by older ones
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPostId {
    Number(PostId),
    Text(String),
}

fn de_post_id<'de, D>(deserializer: D) -> Result<PostId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match RawPostId::deserialize(deserializer)? {
        RawPostId::Number(id) => Ok(id),
        RawPostId::Text(text) => text.parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
struct GeneralEntry {
    #[serde(deserialize_with = "de_post_id")]
    post_id: PostId,
    score: f64,
}

/// Whether data written at `timestamp` is older than `threshold` seconds at `now`
pub fn is_stale(timestamp: i64, now: i64, threshold: u64) -> bool {
    now.saturating_sub(timestamp) > i64::try_from(threshold).unwrap_or(i64::MAX)
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str, what: &'static str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(error = %e, record = what, "Malformed record in score store");
            None
        }
    }
}

/// Parses a per/relate score record, dropping it when stale
pub fn parse_score_record(raw: &str, now: i64, stale_threshold: u64) -> Option<Vec<ScoredPost>> {
    let record: ScoreRecord = parse_json(raw, "score")?;

    if is_stale(record.timestamp, now, stale_threshold) {
        tracing::debug!(
            timestamp = record.timestamp,
            threshold = stale_threshold,
            "Score record is stale"
        );
        return None;
    }

    let posts_scores = record
        .result
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<(PostId, f64)>(entry).ok())
        .filter(|(_, score)| score.is_finite())
        .map(|(post_id, score)| ScoredPost::new(post_id, score))
        .collect();

    Some(posts_scores)
}

/// Parses the general score record into unique candidates
///
/// A post listed twice keeps its first position and its last score.
pub fn parse_general_record(raw: &str) -> Option<Vec<ScoredPost>> {
    let record: GeneralScoreRecord = parse_json(raw, "general score")?;

    let mut positions: HashMap<PostId, usize> = HashMap::new();
    let mut posts_scores: Vec<ScoredPost> = Vec::new();

    for entry in record.data {
        let Ok(entry) = serde_json::from_value::<GeneralEntry>(entry) else {
            continue;
        };
        if !entry.score.is_finite() {
            continue;
        }
        match positions.get(&entry.post_id) {
            Some(&idx) => posts_scores[idx].score = entry.score,
            None => {
                positions.insert(entry.post_id, posts_scores.len());
                posts_scores.push(ScoredPost::new(entry.post_id, entry.score));
            }
        }
    }

    Some(posts_scores)
}

pub fn parse_history_record(raw: &str, user_id: UserId) -> Option<User> {
    let record: HistoryRecord = parse_json(raw, "user history")?;

    Some(User::with_history(
        user_id,
        record.positive.into_iter().map(Post::new).collect(),
        record.negative.into_iter().map(Post::new).collect(),
    ))
}

/// Reads shown-post entries, skipping malformed ones
pub fn parse_shown_entries(raw: &str) -> Vec<ShownEntry> {
    parse_json::<ShownPostsRecord>(raw, "shown posts")
        .unwrap_or_default()
        .data
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect()
}

/// Posts shown at least `min_freq` times within the freshness window
///
/// Order follows the first fresh occurrence of each post.
pub fn frequent_shown_posts(
    entries: &[ShownEntry],
    now: i64,
    stale_threshold: u64,
    min_freq: usize,
) -> Vec<Post> {
    let mut order: Vec<PostId> = Vec::new();
    let mut counts: HashMap<PostId, usize> = HashMap::new();

    for entry in entries {
        if is_stale(entry.timestamp, now, stale_threshold) {
            continue;
        }
        let count = counts.entry(entry.post_id).or_insert(0);
        if *count == 0 {
            order.push(entry.post_id);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|post_id| counts[post_id] >= min_freq)
        .map(Post::new)
        .collect()
}

/// Prepends freshly shown posts to the still-fresh old entries
pub fn merge_shown_entries(
    posts: &[Post],
    old_entries: Vec<ShownEntry>,
    now: i64,
    stale_threshold: u64,
) -> Vec<ShownEntry> {
    posts
        .iter()
        .map(|post| ShownEntry {
            post_id: post.id,
            timestamp: now,
        })
        .chain(
            old_entries
                .into_iter()
                .filter(|entry| !is_stale(entry.timestamp, now, stale_threshold)),
        )
        .collect()
}
