use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use ac_core::{ContentFetcher, Error, FetchedContent, Result};

use crate::extract::extract_content;

const USER_AGENT: &str = concat!("article-chat/", env!("CARGO_PKG_VERSION"));

/// Downloads a page over HTTP and extracts its readable content.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Fetch(format!("failed to fetch {url}: {e}")))?;
        let html = response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("failed to read body of {url}: {e}")))?;

        let content = extract_content(&html);
        if content.title.is_empty() && content.text.is_empty() {
            return Err(Error::Fetch(format!("no readable content found at {url}")));
        }
        tracing::debug!(%url, title = %content.title, chars = content.text.len(), "fetched article");
        Ok(content)
    }
}
