use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};
use crate::response::Response;

/// Upper bound on cached responses. Once reached the cache stops growing
/// and nothing is ever evicted.
pub const MAX_CACHE_ENTRIES: usize = 50;

pub const DEFAULT_DOCUMENT: &str = "index.html";

/// How a decoded request path is joined onto the static root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathPolicy {
    /// Plain concatenation. `..` segments are passed to the filesystem and
    /// can reach outside the root.
    #[default]
    Verbatim,
    /// `.` and `..` segments are resolved lexically first so the result
    /// stays under the root.
    Confined,
}

/// Serves files below a root directory and remembers up to
/// [`MAX_CACHE_ENTRIES`] serialized 200 responses keyed by decoded path.
///
/// Cached entries are never revalidated: a file changed on disk after it
/// was first served keeps being answered with the old bytes.
#[derive(Debug)]
pub struct StaticFiles {
    root: String,
    policy: PathPolicy,
    cache: Mutex<FxHashMap<String, Arc<[u8]>>>,
}

impl StaticFiles {
    pub fn new(root: impl Into<String>) -> Result<Self> {
        Self::with_policy(root, PathPolicy::Verbatim)
    }

    pub fn with_policy(root: impl Into<String>, policy: PathPolicy) -> Result<Self> {
        let root = root.into();
        if !Path::new(&root).exists() {
            return Err(Error::StaticRootMissing(root.into()));
        }

        Ok(Self {
            root,
            policy,
            cache: Mutex::new(FxHashMap::default()),
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn policy(&self) -> PathPolicy {
        self.policy
    }

    /// Returns the full serialized response for `decoded_path`.
    pub async fn resolve(&self, decoded_path: &str) -> Result<Arc<[u8]>> {
        let cached = self.cache.lock().get(decoded_path).cloned();
        if let Some(response) = cached {
            return Ok(response);
        }

        let file_path = self.file_path(decoded_path);

        // Permission and I/O problems are reported the same way as a missing file
        let is_file = match fs::metadata(&file_path).await {
            Ok(metadata) => metadata.is_file(),
            Err(e) => {
                debug!(path = %file_path, error = %e, "Static file lookup failed");
                false
            }
        };
        if !is_file {
            debug!(path = %file_path, "File not found");
            return Err(Error::NotFound(file_path));
        }

        let content = match fs::read(&file_path).await {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %file_path, error = %e, "Static file read failed");
                return Err(Error::NotFound(file_path));
            }
        };

        let response: Arc<[u8]> = Response::ok(content).to_bytes().into();
        Ok(self.remember(decoded_path, response))
    }

    // Check and insert happen under one lock. If another worker cached the
    // same path first, its entry is the one everybody gets.
    fn remember(&self, decoded_path: &str, response: Arc<[u8]>) -> Arc<[u8]> {
        let mut cache = self.cache.lock();
        if let Some(existing) = cache.get(decoded_path) {
            return existing.clone();
        }
        if cache.len() < MAX_CACHE_ENTRIES {
            cache.insert(decoded_path.to_string(), response.clone());
        }
        response
    }

    /// Filesystem path a decoded request path maps to.
    pub fn file_path(&self, decoded_path: &str) -> String {
        let mut file_path = match self.policy {
            PathPolicy::Verbatim => format!("{}{}", self.root, decoded_path),
            PathPolicy::Confined => format!("{}{}", self.root, confine_path(decoded_path)),
        };

        if file_path.ends_with('/') {
            file_path.push_str(DEFAULT_DOCUMENT);
        }
        file_path
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_cached(&self, decoded_path: &str) -> bool {
        self.cache.lock().contains_key(decoded_path)
    }

    pub fn cached(&self, decoded_path: &str) -> Option<Arc<[u8]>> {
        self.cache.lock().get(decoded_path).cloned()
    }
}

/// Resolves `.` and `..` lexically so the result is always rooted at `/`.
/// A trailing slash is kept so directory requests still get the default
/// document.
pub fn confine_path(path: &str) -> String {
    let mut stack = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                stack.pop();
            }
            _ => stack.push(part),
        }
    }

    let mut normalized = format!("/{}", stack.join("/"));
    if path.ends_with('/') && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
