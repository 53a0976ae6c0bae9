use serde::{Deserialize, Serialize};

/// A blog post as served by `/posts` and `/posts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u32,
    pub title: String,
    pub body: String,
}

impl Post {
    pub fn new(id: u32, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            body: body.into(),
        }
    }
}
