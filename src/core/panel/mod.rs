pub mod cache;

use crate::core::feed::fetcher::{FeedSource, FetchError, HttpFeedSource, LocalFeedResolver};
use crate::core::feed::parser::{normalize, parse_feed_document, FeedParseError};
use crate::core::feed::types::PanelEntry;

use cache::{PanelCache, PanelSide};

pub const PANEL_ENTRY_SIZE: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] FeedParseError),
}

/// Landing-page panel queries: fetch, normalize and memoize feed entries.
#[derive(Debug)]
pub struct PanelService<S = HttpFeedSource> {
    source: S,
    resolver: LocalFeedResolver,
    cache: PanelCache,
    max_entries: usize,
}

impl<S: FeedSource> PanelService<S> {
    pub fn new(source: S, resolver: LocalFeedResolver) -> Self {
        Self {
            source,
            resolver,
            cache: PanelCache::new(),
            max_entries: PANEL_ENTRY_SIZE,
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn cache(&self) -> &PanelCache {
        &self.cache
    }

    pub fn name(&self) -> &'static str {
        "panel"
    }

    pub fn status(&self) -> &'static str {
        "ready"
    }

    /// Entries for the left panel; replies are excluded.
    pub async fn left_panel_entries(&self, feed_url: &str) -> Vec<PanelEntry> {
        self.side_entries(PanelSide::Left, feed_url).await
    }

    /// Entries for the right panel; replies are included.
    pub async fn right_panel_entries(&self, feed_url: &str) -> Vec<PanelEntry> {
        self.side_entries(PanelSide::Right, feed_url).await
    }

    pub async fn side_entries(&self, side: PanelSide, feed_url: &str) -> Vec<PanelEntry> {
        self.cache
            .get_or_compute(side, feed_url, || {
                self.panel_entries(feed_url, self.max_entries, side.includes_replies())
            })
            .await
    }

    /// Uncached fetch. Any failure is logged and yields an empty list.
    pub async fn panel_entries(
        &self,
        feed_url: &str,
        max_size: usize,
        include_replies: bool,
    ) -> Vec<PanelEntry> {
        match self.try_panel_entries(feed_url, max_size, include_replies).await {
            Ok(entries) => entries,
            Err(error) => {
                tracing::error!(feed_url, error = %error, "error while fetching the feed entries");
                Vec::new()
            }
        }
    }

    pub async fn try_panel_entries(
        &self,
        feed_url: &str,
        max_size: usize,
        include_replies: bool,
    ) -> Result<Vec<PanelEntry>, PanelError> {
        let url = self.resolver.resolve(feed_url)?;
        let fetched = self.source.fetch(&url).await?;
        let feed = parse_feed_document(&fetched.body, fetched.content_type.as_deref())?;
        Ok(normalize(&feed, max_size, include_replies))
    }
}
