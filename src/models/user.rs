use std::collections::{HashMap, HashSet};

use super::{Encode, Post};

pub type UserId = i64;

/// A reader with their interaction history
///
/// Positive and negative histories keep first-insertion order and never hold
/// the same post twice.
#[derive(Debug, Clone, Default)]
pub struct User {
    pub id: UserId,
    positive_posts: Vec<Post>,
    negative_posts: Vec<Post>,
    encodes: HashMap<String, Encode>,
}

impl User {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_history(id: UserId, positive: Vec<Post>, negative: Vec<Post>) -> Self {
        let mut user = Self::new(id);
        user.add_positive_posts(positive);
        user.add_negative_posts(negative);
        user
    }

    pub fn positive_posts(&self) -> &[Post] {
        &self.positive_posts
    }

    pub fn negative_posts(&self) -> &[Post] {
        &self.negative_posts
    }

    pub fn add_positive_posts(&mut self, posts: impl IntoIterator<Item = Post>) {
        append_unique(&mut self.positive_posts, posts);
    }

    pub fn add_negative_posts(&mut self, posts: impl IntoIterator<Item = Post>) {
        append_unique(&mut self.negative_posts, posts);
    }

    pub fn add_encode(&mut self, encode: Encode) {
        self.encodes.insert(encode.name.clone(), encode);
    }

    pub fn get_encode(&self, name: &str) -> Option<&Encode> {
        self.encodes.get(name)
    }

    /// Unions the histories and encodings of `other` into this user
    ///
    /// Users with a different id are ignored.
    pub fn update(&mut self, other: &User) {
        if self.id != other.id {
            return;
        }

        self.add_positive_posts(other.positive_posts.iter().cloned());
        self.add_negative_posts(other.negative_posts.iter().cloned());
        for encode in other.encodes.values() {
            self.add_encode(encode.clone());
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl std::hash::Hash for User {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn append_unique(target: &mut Vec<Post>, posts: impl IntoIterator<Item = Post>) {
    let mut seen: HashSet<i64> = target.iter().map(|p| p.id).collect();
    for post in posts {
        if seen.insert(post.id) {
            target.push(post);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(posts: &[Post]) -> Vec<i64> {
        posts.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_history_keeps_first_insertion_order() {
        let mut user = User::new(42);
        user.add_positive_posts(vec![Post::new(3), Post::new(1), Post::new(3)]);
        user.add_positive_posts(vec![Post::new(2), Post::new(1)]);

        assert_eq!(ids(user.positive_posts()), vec![3, 1, 2]);
    }

    #[test]
    fn test_update_unions_history() {
        let mut user = User::with_history(42, vec![Post::new(1)], vec![Post::new(9)]);
        let mut fetched = User::with_history(42, vec![Post::new(2), Post::new(1)], vec![]);
        fetched.add_encode(Encode::new("history", 10, vec![1.0]));

        user.update(&fetched);

        assert_eq!(ids(user.positive_posts()), vec![1, 2]);
        assert_eq!(ids(user.negative_posts()), vec![9]);
        assert!(user.get_encode("history").is_some());
    }

    #[test]
    fn test_update_ignores_other_user() {
        let mut user = User::new(1);
        user.update(&User::with_history(2, vec![Post::new(5)], vec![]));

        assert!(user.positive_posts().is_empty());
    }
}
