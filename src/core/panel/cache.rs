use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;

use crate::core::feed::types::PanelEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelSide {
    Left,
    Right,
}

impl PanelSide {
    /// Left panels hide forum replies, right panels show them.
    pub fn includes_replies(self) -> bool {
        matches!(self, PanelSide::Right)
    }

    pub fn cache_name(self) -> &'static str {
        match self {
            PanelSide::Left => "left_panel_entries",
            PanelSide::Right => "right_panel_entries",
        }
    }
}

type EntryMap = RwLock<HashMap<String, Vec<PanelEntry>>>;

/// Memoized panel entries, one keyspace per panel side.
///
/// Locks are only held to read or insert, never while computing a value, so concurrent
/// misses on the same key may compute twice. The first stored value wins.
#[derive(Debug, Default)]
pub struct PanelCache {
    left: EntryMap,
    right: EntryMap,
}

impl PanelCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, side: PanelSide) -> &EntryMap {
        match side {
            PanelSide::Left => &self.left,
            PanelSide::Right => &self.right,
        }
    }

    pub fn get(&self, side: PanelSide, feed_url: &str) -> Option<Vec<PanelEntry>> {
        self.map(side)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(feed_url)
            .cloned()
    }

    /// Stores `entries` unless the key was populated meanwhile; returns the stored value.
    pub fn insert(&self, side: PanelSide, feed_url: &str, entries: Vec<PanelEntry>) -> Vec<PanelEntry> {
        self.map(side)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(feed_url.to_string())
            .or_insert(entries)
            .clone()
    }

    pub async fn get_or_compute<F, Fut>(
        &self,
        side: PanelSide,
        feed_url: &str,
        compute: F,
    ) -> Vec<PanelEntry>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<PanelEntry>>,
    {
        if let Some(entries) = self.get(side, feed_url) {
            tracing::debug!(cache = side.cache_name(), feed_url, "panel cache hit");
            return entries;
        }
        tracing::debug!(cache = side.cache_name(), feed_url, "panel cache miss");
        let computed = compute().await;
        self.insert(side, feed_url, computed)
    }

    pub fn invalidate(&self, side: PanelSide, feed_url: &str) -> bool {
        self.map(side)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(feed_url)
            .is_some()
    }

    pub fn clear(&self) {
        for side in [PanelSide::Left, PanelSide::Right] {
            self.map(side)
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
        }
    }

    pub fn len(&self, side: PanelSide) -> usize {
        self.map(side)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
