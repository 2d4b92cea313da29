pub mod config;
pub mod feed;
pub mod messages;
pub mod panel;
pub mod static_files;

use std::collections::BTreeMap;

use feed::fetcher::FeedSource;
use messages::MessageCatalog;
use panel::PanelService;
use static_files::LocalFeedFiles;

#[derive(Debug)]
pub struct AppServices<S> {
    pub panel: PanelService<S>,
    pub files: LocalFeedFiles,
    pub messages: MessageCatalog,
}

impl<S: FeedSource> AppServices<S> {
    pub fn health_report(&self) -> BTreeMap<String, String> {
        let mut report = BTreeMap::new();
        report.insert(self.panel.name().to_string(), self.panel.status().to_string());
        report.insert(self.files.name().to_string(), self.files.status().to_string());
        report.insert(
            self.messages.name().to_string(),
            self.messages.status().to_string(),
        );
        report
    }
}
