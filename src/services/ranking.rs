//! Candidate ranking shared by every recommender
//!
//! Excluded posts are demoted, not removed: they only fill the list when there
//! are not enough fresh candidates to reach the limit.
use std::collections::HashSet;

use crate::models::{Post, ScoredPost, User};

/// Posts the user already engaged with, plus any externally excluded posts
pub fn excluded_posts(user: &User, extra: Option<Vec<Post>>) -> HashSet<Post> {
    user.positive_posts()
        .iter()
        .cloned()
        .chain(extra.into_iter().flatten())
        .collect()
}

/// Stable sort by descending score; equal scores keep their encounter order
pub fn sort_by_score_desc(candidates: &mut [ScoredPost]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Keeps the first occurrence of every post
fn dedup_posts(candidates: Vec<ScoredPost>) -> Vec<ScoredPost> {
    let mut seen: HashSet<i64> = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.post_id()))
        .collect()
}

/// Ranks candidates with excluded posts pushed behind every other post
///
/// Included and excluded candidates are sorted separately by score. When the
/// included ones already reach `limit`, excluded ones are dropped entirely;
/// otherwise they pad the list in their own score order. A post listed twice
/// keeps its best score.
pub fn rank_with_exclusion(
    candidates: Vec<ScoredPost>,
    excluded: &HashSet<Post>,
    limit: usize,
) -> Vec<ScoredPost> {
    let (mut included, mut demoted): (Vec<ScoredPost>, Vec<ScoredPost>) = candidates
        .into_iter()
        .partition(|candidate| !excluded.contains(&candidate.post));

    sort_by_score_desc(&mut included);
    let mut included = dedup_posts(included);
    if included.len() >= limit {
        included.truncate(limit);
        return included;
    }

    sort_by_score_desc(&mut demoted);
    included.extend(dedup_posts(demoted));
    included.truncate(limit);
    included
}

/// How many posts each list contributes in a weaving round: `(related, personalized)`
pub fn weave_counts(round: usize) -> (usize, usize) {
    match round {
        0 => (3, 1),
        1 => (1, 2),
        _ => (1, 1),
    }
}

/// Interleaves a related list with a personalized list
///
/// Each round takes posts from the front of the related list, then from the
/// front of the personalized list, following [`weave_counts`]. A post already
/// taken is skipped without taking a replacement in its place. Weaving stops as
/// soon as `limit` posts are collected or both lists run out.
pub fn weave(
    related: Vec<ScoredPost>,
    personalized: Vec<ScoredPost>,
    limit: usize,
) -> Vec<ScoredPost> {
    let mut related = related.into_iter();
    let mut personalized = personalized.into_iter();
    let mut seen: HashSet<i64> = HashSet::new();
    let mut merged: Vec<ScoredPost> = Vec::with_capacity(limit);

    let mut round = 0;
    loop {
        let (num_related, num_per) = weave_counts(round);
        let mut took_any = false;

        for candidate in related.by_ref().take(num_related) {
            took_any = true;
            if seen.insert(candidate.post_id()) {
                merged.push(candidate);
            }
        }
        for candidate in personalized.by_ref().take(num_per) {
            took_any = true;
            if seen.insert(candidate.post_id()) {
                merged.push(candidate);
            }
        }

        if merged.len() >= limit {
            merged.truncate(limit);
            return merged;
        }
        if !took_any {
            return merged;
        }
        round += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostId;

    fn scored(pairs: &[(PostId, f64)]) -> Vec<ScoredPost> {
        pairs
            .iter()
            .map(|&(id, score)| ScoredPost::new(id, score))
            .collect()
    }

    fn ids(posts: &[ScoredPost]) -> Vec<PostId> {
        posts.iter().map(ScoredPost::post_id).collect()
    }

    fn excluded(ids: &[PostId]) -> HashSet<Post> {
        ids.iter().copied().map(Post::new).collect()
    }

    #[test]
    fn test_excluded_posts_unions_history_and_extra() {
        let user = User::with_history(42, vec![Post::new(7), Post::new(8)], vec![Post::new(9)]);

        let set = excluded_posts(&user, Some(vec![Post::new(8), Post::new(10)]));

        assert_eq!(set, excluded(&[7, 8, 10]));
        assert_eq!(excluded_posts(&user, None), excluded(&[7, 8]));
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut posts = scored(&[(1, 0.5), (2, 0.9), (3, 0.5), (4, 0.5)]);

        sort_by_score_desc(&mut posts);

        assert_eq!(ids(&posts), vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_enough_included_drops_excluded() {
        // User 42 engaged with post 7
        let candidates = scored(&[(1, 0.9), (7, 0.8), (2, 0.5)]);

        let ranked = rank_with_exclusion(candidates, &excluded(&[7]), 2);

        assert_eq!(ids(&ranked), vec![1, 2]);
    }

    #[test]
    fn test_excluded_pad_shortfall_after_included() {
        let candidates = scored(&[(1, 0.1), (7, 0.99), (2, 0.5), (8, 0.3)]);

        let ranked = rank_with_exclusion(candidates, &excluded(&[7, 8]), 3);

        assert_eq!(ids(&ranked), vec![2, 1, 7]);
    }

    #[test]
    fn test_short_list_returns_everything() {
        let candidates = scored(&[(1, 0.1), (7, 0.99)]);

        let ranked = rank_with_exclusion(candidates, &excluded(&[7]), 10);

        assert_eq!(ids(&ranked), vec![1, 7]);
    }

    #[test]
    fn test_duplicates_keep_best_score() {
        let candidates = scored(&[(1, 0.2), (2, 0.5), (1, 0.8), (7, 0.4), (7, 0.6)]);

        let ranked = rank_with_exclusion(candidates, &excluded(&[7]), 5);

        assert_eq!(ids(&ranked), vec![1, 2, 7]);
        assert_eq!(ranked[0].score, 0.8);
        assert_eq!(ranked[2].score, 0.6);
    }

    #[test]
    fn test_zero_limit_is_empty() {
        let ranked = rank_with_exclusion(scored(&[(1, 0.2)]), &HashSet::new(), 0);

        assert!(ranked.is_empty());
    }

    #[test]
    fn test_weave_counts_schedule() {
        assert_eq!(weave_counts(0), (3, 1));
        assert_eq!(weave_counts(1), (1, 2));
        assert_eq!(weave_counts(2), (1, 1));
        assert_eq!(weave_counts(17), (1, 1));
    }

    #[test]
    fn test_weave_stops_at_limit() {
        let related = scored(&(1..=10).map(|i| (i, 1.0)).collect::<Vec<_>>());
        let personalized = scored(&(101..=110).map(|i| (i, 1.0)).collect::<Vec<_>>());

        let merged = weave(related, personalized, 6);

        assert_eq!(ids(&merged), vec![1, 2, 3, 101, 4, 102]);
    }

    #[test]
    fn test_weave_later_rounds_alternate() {
        let related = scored(&(1..=10).map(|i| (i, 1.0)).collect::<Vec<_>>());
        let personalized = scored(&(101..=110).map(|i| (i, 1.0)).collect::<Vec<_>>());

        let merged = weave(related, personalized, 11);

        assert_eq!(
            ids(&merged),
            vec![1, 2, 3, 101, 4, 102, 103, 5, 104, 6, 105]
        );
    }

    #[test]
    fn test_weave_skips_duplicates_without_substitution() {
        let related = scored(&[(1, 0.9), (2, 0.8), (3, 0.7), (4, 0.6)]);
        let personalized = scored(&[(2, 0.9), (5, 0.8), (6, 0.7)]);

        let merged = weave(related, personalized, 10);

        // Round 0 consumes post 2 from the personalized list without a replacement
        assert_eq!(ids(&merged), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_weave_drains_longer_list() {
        let related = scored(&[(1, 0.9)]);
        let personalized = scored(&[(11, 0.9), (12, 0.8), (13, 0.7), (14, 0.6)]);

        let merged = weave(related, personalized, 10);

        assert_eq!(ids(&merged), vec![1, 11, 12, 13, 14]);
    }
}
