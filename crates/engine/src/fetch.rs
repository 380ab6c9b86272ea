//! Blocking HTTP fetch. Every request is awaited individually; a failed
//! source degrades to an empty contribution rather than failing the batch.

use anyhow::Context as _;
use homedeck_core::{FeedItem, FeedSource};

use crate::feed;

pub struct Fetcher {
    agent: ureq::Agent,
}

impl Fetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("homedeck/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }

    pub fn text(&self, url: &str) -> anyhow::Result<String> {
        let response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("fetch {url}"))?;
        response
            .into_string()
            .with_context(|| format!("read body of {url}"))
    }

    /// Fetch and merge every source, newest first, capped at `limit`.
    pub fn feed_items(&self, sources: &[FeedSource], limit: usize, now: i64) -> Vec<FeedItem> {
        let mut items = Vec::new();
        for source in sources {
            match self.text(&source.xml_url) {
                Ok(body) => items.extend(feed::parse_items(&body, &source.title, now)),
                Err(err) => {
                    tracing::warn!(feed = %source.title, "feed fetch failed: {err:#}");
                }
            }
        }
        items.sort_by(|a, b| b.published.cmp(&a.published));
        items.truncate(limit);
        items
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}
