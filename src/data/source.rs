//! Byte retrieval for the dataset and model identifiers.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::AppError;

/// Anything that can turn an identifier into bytes.
pub trait ByteSource: Send + Sync {
    fn fetch(&self, identifier: &str) -> Result<Vec<u8>, AppError>;
}

/// Fetches `http(s)://` identifiers with a blocking client; anything else
/// (a bare path or a `file://` URL) is read from the local filesystem.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::ingestion(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn fetch_http(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::ingestion(format!("Request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::ingestion(format!(
                "Request to {url} failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .bytes()
            .map_err(|e| AppError::ingestion(format!("Failed to read response from {url}: {e}")))?;
        Ok(body.to_vec())
    }
}

impl ByteSource for HttpSource {
    fn fetch(&self, identifier: &str) -> Result<Vec<u8>, AppError> {
        let bytes = match local_path(identifier) {
            Some(path) => std::fs::read(path)
                .map_err(|e| AppError::ingestion(format!("Failed to read '{}': {e}", path.display())))?,
            None => self.fetch_http(identifier)?,
        };
        info!(source = identifier, bytes = bytes.len(), "fetched");
        Ok(bytes)
    }
}

/// `Some(path)` when the identifier does not name an HTTP resource.
pub fn local_path(identifier: &str) -> Option<&Path> {
    let lower = identifier.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return None;
    }
    let path = identifier.strip_prefix("file://").unwrap_or(identifier);
    Some(Path::new(path))
}

/// Cache file name for an identifier: `<kind>-<hash>.<extension>`.
///
/// The hash keeps distinct identifiers from overwriting each other while the
/// same identifier always maps to the same file.
pub fn artifact_name(kind: &str, identifier: &str, extension: &str) -> String {
    let hash = blake3::hash(identifier.as_bytes()).to_hex();
    format!("{kind}-{}.{extension}", &hash.as_str()[..16])
}

/// Persist downloaded bytes as `<dir>/<file_name>` and return the path.
pub fn write_artifact(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::ingestion(format!("Failed to create cache dir '{}': {e}", dir.display())))?;

    let path = dir.join(file_name);
    let mut file = File::create(&path)
        .map_err(|e| AppError::ingestion(format!("Failed to create '{}': {e}", path.display())))?;
    file.write_all(bytes)
        .map_err(|e| AppError::ingestion(format!("Failed to write '{}': {e}", path.display())))?;

    debug!(path = %path.display(), bytes = bytes.len(), "wrote cache artifact");
    Ok(path)
}
