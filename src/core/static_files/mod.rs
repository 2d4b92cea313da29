use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOCAL_FEED_DIR: &str = "localXmlFiles";

#[derive(Debug, thiserror::Error)]
pub enum StaticFileError {
    #[error("invalid local file name: {0:?}")]
    InvalidName(String),
    #[error("local file not found: {0}")]
    NotFound(String),
    #[error("failed to read local file {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Serves bundled feed documents from a single directory by bare file name.
#[derive(Debug, Clone)]
pub struct LocalFeedFiles {
    root: PathBuf,
}

impl LocalFeedFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &'static str {
        "static_files"
    }

    pub fn status(&self) -> &'static str {
        if self.root.is_dir() {
            "ready"
        } else {
            "missing"
        }
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf, StaticFileError> {
        let name = name.trim();
        if name.is_empty()
            || name == "."
            || name.contains("..")
            || name.contains(['/', '\\'])
        {
            return Err(StaticFileError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StaticFileError> {
        let path = self.path_for(name)?;
        tokio::fs::read(&path).await.map_err(|source| match source.kind() {
            ErrorKind::NotFound => StaticFileError::NotFound(name.to_string()),
            _ => StaticFileError::Io {
                name: name.to_string(),
                source,
            },
        })
    }
}

/// Response `Content-Type` for a served file, carrying the request's charset if it declared one.
pub fn xml_content_type(request_content_type: Option<&str>) -> String {
    let charset = request_content_type.and_then(|value| {
        value
            .split(';')
            .skip(1)
            .filter_map(|parameter| parameter.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, charset)| charset.trim().trim_matches('"').to_string())
            .filter(|charset| !charset.is_empty())
    });
    match charset {
        Some(charset) => format!("application/xml;charset={charset}"),
        None => "application/xml".to_string(),
    }
}
