use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use super::Encode;

pub type PostId = i64;

/// A news post
///
/// Identity is the numeric id alone: two posts with the same id are equal and
/// hash the same regardless of which descriptive fields have been loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    /// Named entities extracted from the post
    #[serde(default)]
    pub entities: Option<String>,
    #[serde(default)]
    pub category: Option<i32>,
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub num_clicks: Option<u64>,
    #[serde(default)]
    pub num_views: Option<u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    encodes: HashMap<String, Encode>,
}

impl Post {
    /// Creates a post carrying only its id
    pub fn new(id: PostId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn add_encode(&mut self, encode: Encode) {
        self.encodes.insert(encode.name.clone(), encode);
    }

    pub fn add_encodes(&mut self, encodes: impl IntoIterator<Item = Encode>) {
        for encode in encodes {
            self.add_encode(encode);
        }
    }

    pub fn get_encode(&self, name: &str) -> Option<&Encode> {
        self.encodes.get(name)
    }

    pub fn encodes(&self) -> impl Iterator<Item = &Encode> {
        self.encodes.values()
    }

    /// Merges the loaded fields of `other` into this post
    ///
    /// Only fields present on `other` overwrite ours; encodings are unioned with
    /// `other` winning on name clashes. Posts with a different id are ignored.
    pub fn update(&mut self, other: &Post) {
        if self.id != other.id {
            return;
        }

        if other.title.is_some() {
            self.title.clone_from(&other.title);
        }
        if other.summary.is_some() {
            self.summary.clone_from(&other.summary);
        }
        if other.body.is_some() {
            self.body.clone_from(&other.body);
        }
        if other.tags.is_some() {
            self.tags.clone_from(&other.tags);
        }
        if other.entities.is_some() {
            self.entities.clone_from(&other.entities);
        }
        if other.category.is_some() {
            self.category = other.category;
        }
        if other.publish_date.is_some() {
            self.publish_date = other.publish_date;
        }
        if other.num_clicks.is_some() {
            self.num_clicks = other.num_clicks;
        }
        if other.num_views.is_some() {
            self.num_views = other.num_views;
        }

        self.add_encodes(other.encodes().cloned());
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Post {}

impl Hash for Post {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<PostId> for Post {
    fn from(id: PostId) -> Self {
        Post::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_loaded_fields() {
        let mut loaded = Post::new(7);
        loaded.title = Some("Election results".to_string());

        assert_eq!(loaded, Post::new(7));
        assert_ne!(loaded, Post::new(8));

        let set: HashSet<Post> = [loaded, Post::new(7)].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_update_merges_present_fields() {
        let mut post = Post::new(1);
        post.title = Some("Old title".to_string());
        post.category = Some(3);

        let mut other = Post::new(1);
        other.title = Some("New title".to_string());
        other.num_views = Some(120);
        other.add_encode(Encode::new("roberta", 100, vec![0.1, 0.2]));

        post.update(&other);

        assert_eq!(post.title.as_deref(), Some("New title"));
        assert_eq!(post.category, Some(3));
        assert_eq!(post.num_views, Some(120));
        assert!(post.get_encode("roberta").is_some());
    }

    #[test]
    fn test_update_ignores_other_id() {
        let mut post = Post::new(1);
        let mut other = Post::new(2);
        other.title = Some("Unrelated".to_string());

        post.update(&other);

        assert_eq!(post.title, None);
    }
}
