pub mod core;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::core::config::{AppConfig, ConfigError};
use crate::core::feed::fetcher::{
    FeedSource, FetchError, HttpFeedSource, LocalFeedResolver, ServerPort, LOCAL_XML_ROUTE,
};
use crate::core::feed::types::PanelEntry;
use crate::core::messages::{MessageCatalog, MessageCatalogError, Messages};
use crate::core::panel::PanelService;
use crate::core::static_files::{xml_content_type, LocalFeedFiles, StaticFileError};
use crate::core::AppServices;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build http client: {0}")]
    Client(#[from] FetchError),
    #[error(transparent)]
    Messages(#[from] MessageCatalogError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct PanelQuery {
    #[serde(rename = "feedUrl")]
    feed_url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct XmlQuery {
    #[serde(rename = "xmlName", default)]
    xml_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LocaleQuery {
    locale: String,
}

type SharedServices<S> = Arc<AppServices<S>>;

pub fn router<S: FeedSource + 'static>(services: SharedServices<S>) -> Router {
    Router::new()
        .route(LOCAL_XML_ROUTE, get(get_xml::<S>))
        .route("/home/api/panel/left", get(left_panel::<S>))
        .route("/home/api/panel/right", get(right_panel::<S>))
        .route("/home/api/messages", get(user_defined_messages::<S>))
        .route("/home/api/health", get(app_health::<S>))
        .with_state(services)
}

async fn app_health<S: FeedSource>(
    State(services): State<SharedServices<S>>,
) -> Json<BTreeMap<String, String>> {
    Json(services.health_report())
}

async fn left_panel<S: FeedSource>(
    State(services): State<SharedServices<S>>,
    Query(query): Query<PanelQuery>,
) -> Json<Vec<PanelEntry>> {
    Json(services.panel.left_panel_entries(&query.feed_url).await)
}

async fn right_panel<S: FeedSource>(
    State(services): State<SharedServices<S>>,
    Query(query): Query<PanelQuery>,
) -> Json<Vec<PanelEntry>> {
    Json(services.panel.right_panel_entries(&query.feed_url).await)
}

async fn user_defined_messages<S: FeedSource>(
    State(services): State<SharedServices<S>>,
    Query(query): Query<LocaleQuery>,
) -> Json<Option<Messages>> {
    Json(
        services
            .messages
            .user_defined_messages(&query.locale)
            .cloned(),
    )
}

/// Serves a bundled feed file. Failures are logged and answered without a body.
async fn get_xml<S: FeedSource>(
    State(services): State<SharedServices<S>>,
    Query(query): Query<XmlQuery>,
    headers: HeaderMap,
) -> Response {
    let content_type = xml_content_type(
        headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
    );
    match services.files.read(&query.xml_name).await {
        Ok(body) => ([(CONTENT_TYPE, content_type)], body).into_response(),
        Err(error) => {
            tracing::error!(xml_name = %query.xml_name, error = %error, "failed to serve local feed file");
            let status = match error {
                StaticFileError::InvalidName(_) | StaticFileError::NotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                StaticFileError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
            status.into_response()
        }
    }
}

pub fn build_services(
    config: &AppConfig,
    port: ServerPort,
) -> Result<AppServices<HttpFeedSource>, AppError> {
    let source = HttpFeedSource::new(config.fetch_timeout)?;
    let resolver = LocalFeedResolver::new(port, config.default_local_feed.clone());
    let messages = config
        .message_catalog
        .as_deref()
        .map(MessageCatalog::load)
        .transpose()?
        .unwrap_or_default();

    Ok(AppServices {
        panel: PanelService::new(source, resolver).with_max_entries(config.panel_entry_size),
        files: LocalFeedFiles::new(config.local_feed_dir.clone()),
        messages,
    })
}

/// Binds the configured address, publishes the bound port and serves until shutdown.
pub async fn serve(config: AppConfig) -> Result<(), AppError> {
    let port = ServerPort::default();
    let services = build_services(&config, port.clone())?;
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let address = listener.local_addr()?;
    port.set(address.port());
    tracing::info!(
        %address,
        local_feed_dir = %config.local_feed_dir.display(),
        "home panel listening"
    );
    axum::serve(listener, router(Arc::new(services))).await?;
    Ok(())
}

pub async fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    serve(config).await
}
