use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item of a syndication feed, decoupled from the parsing library's model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub uri: Option<String>,
    pub author: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeed {
    pub entries: Vec<RawFeedEntry>,
}

/// Normalized record shown on a landing-page feed panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PanelEntry {
    pub author: Option<String>,
    pub title: String,
    pub link: String,
    pub last_updated_date: DateTime<Utc>,
}
