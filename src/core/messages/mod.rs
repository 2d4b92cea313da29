use std::collections::{BTreeMap, HashMap};
use std::path::Path;

pub type Messages = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum MessageCatalogError {
    #[error("failed to read message catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid message catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// User-defined UI messages keyed by locale.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    by_locale: HashMap<String, Messages>,
}

impl MessageCatalog {
    pub fn from_json(input: &str) -> Result<Self, MessageCatalogError> {
        let by_locale: HashMap<String, Messages> = serde_json::from_str(input)?;
        Ok(Self { by_locale })
    }

    pub fn load(path: &Path) -> Result<Self, MessageCatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn name(&self) -> &'static str {
        "messages"
    }

    pub fn status(&self) -> &'static str {
        if self.by_locale.is_empty() {
            "empty"
        } else {
            "ready"
        }
    }

    pub fn user_defined_messages(&self, locale: &str) -> Option<&Messages> {
        self.by_locale.get(locale)
    }
}
