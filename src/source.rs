//! Fetch seam for static site assets (manifest, header/footer fragments).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request for {path} failed: {reason}")]
    Failed { path: String, reason: String },
}

/// Something that can fetch a site-relative asset as text.
pub trait AssetSource {
    fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

/// Serves assets from a site directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location of a site-relative path. `..` segments are dropped.
    pub fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .fold(self.root.clone(), |acc, seg| acc.join(seg))
    }
}

impl AssetSource for DirSource {
    fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let full = self.resolve(path);
        std::fs::read_to_string(&full).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                FetchError::NotFound(path.to_string())
            } else {
                FetchError::Io {
                    path: path.to_string(),
                    source,
                }
            }
        })
    }
}

/// In-memory assets keyed by site-relative path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: HashMap<String, Result<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, body: impl Into<String>) -> Self {
        self.assets.insert(normalize(path), Ok(body.into()));
        self
    }

    /// Register a path whose fetch fails with `reason`.
    pub fn with_failure(mut self, path: &str, reason: &str) -> Self {
        self.assets.insert(normalize(path), Err(reason.to_string()));
        self
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, path: &str) -> Result<String, FetchError> {
        match self.assets.get(&normalize(path)) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(reason)) => Err(FetchError::Failed {
                path: path.to_string(),
                reason: reason.clone(),
            }),
            None => Err(FetchError::NotFound(path.to_string())),
        }
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}
