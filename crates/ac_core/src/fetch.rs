use async_trait::async_trait;

use crate::Result;

/// Readable content extracted from a web page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedContent {
    pub title: String,
    pub excerpt: String,
    pub text: String,
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Download `url` and extract its title, excerpt and body text.
    async fn fetch(&self, url: &str) -> Result<FetchedContent>;
}
