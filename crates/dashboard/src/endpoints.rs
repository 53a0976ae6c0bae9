//! Resource URLs for the dashboard's API.

pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Builds absolute resource URLs from the API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl Endpoints {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn posts(&self) -> String {
        format!("{}/posts", self.base)
    }

    /// Route that always answers 404, used to demonstrate the error panel.
    pub fn invalid_posts(&self) -> String {
        format!("{}/invalid-posts", self.base)
    }

    pub fn post(&self, id: u32) -> String {
        format!("{}/posts/{}", self.base, id)
    }

    pub fn users(&self) -> String {
        format!("{}/users", self.base)
    }
}
