use serde::{Deserialize, Serialize};

/// A named vector payload attached to a post or a user
///
/// Encodings are produced upstream (embedding models, sparse features) and
/// filled in lazily by readers. The core only carries them around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encode {
    pub name: String,
    /// Unix timestamp (seconds) at which the encoding was computed
    pub timestamp: i64,
    pub value: Vec<f32>,
}

impl Encode {
    pub fn new(name: impl Into<String>, timestamp: i64, value: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            timestamp,
            value,
        }
    }
}
