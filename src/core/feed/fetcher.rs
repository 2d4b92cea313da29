use std::future::Future;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(8000);
pub const LOCAL_XML_ROUTE: &str = "/home/api/getXml";
pub const LOCAL_WIKI_ALIAS: &str = "local.wiki";
pub const LOCAL_WIKI_FILE: &str = "wiki.atom";

#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
    #[error("local server port is not available yet")]
    LocalPortUnavailable,
}

/// Anything able to retrieve the raw bytes of a feed document.
pub trait FeedSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedFeed, FetchError>> + Send;
}

/// Port the local HTTP server is listening on, published once the listener is bound.
#[derive(Debug, Clone, Default)]
pub struct ServerPort(Arc<AtomicU16>);

impl ServerPort {
    pub fn new(port: u16) -> Self {
        Self(Arc::new(AtomicU16::new(port)))
    }

    pub fn set(&self, port: u16) {
        self.0.store(port, Ordering::Release);
    }

    pub fn get(&self) -> Option<u16> {
        match self.0.load(Ordering::Acquire) {
            0 => None,
            port => Some(port),
        }
    }
}

/// Rewrites local aliases to the bundled-file route of the running server.
#[derive(Debug, Clone)]
pub struct LocalFeedResolver {
    port: ServerPort,
    default_file: String,
}

impl LocalFeedResolver {
    pub fn new(port: ServerPort, default_file: impl Into<String>) -> Self {
        Self {
            port,
            default_file: default_file.into(),
        }
    }

    pub fn is_local_alias(feed_url: &str) -> bool {
        feed_url.contains("local")
    }

    pub fn local_file_name<'a>(&'a self, feed_url: &str) -> &'a str {
        if feed_url == LOCAL_WIKI_ALIAS {
            LOCAL_WIKI_FILE
        } else {
            &self.default_file
        }
    }

    /// Returns the URL to fetch for `feed_url`. The port is read on every call.
    pub fn resolve(&self, feed_url: &str) -> Result<String, FetchError> {
        if !Self::is_local_alias(feed_url) {
            return Ok(feed_url.to_string());
        }
        let port = self.port.get().ok_or(FetchError::LocalPortUnavailable)?;
        Ok(format!(
            "http://127.0.0.1:{port}{LOCAL_XML_ROUTE}?xmlName={}",
            self.local_file_name(feed_url)
        ))
    }
}

#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(concat!("home-panel/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed, FetchError> {
        fetch_feed(&self.client, url).await
    }
}

/// The response (and its connection) is dropped on every return path.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<FetchedFeed, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    let body = response.bytes().await?.to_vec();

    Ok(FetchedFeed { body, content_type })
}
