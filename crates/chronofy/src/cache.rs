//! Token cache contract and implementations.
//!
//! The client mirrors its access token into a [`TokenCache`] under the
//! configured key. By default the cache is only used to invalidate that key
//! when the upstream API rejects the token; see
//! [`ClientOptions::cache_tokens`](crate::ClientOptions::cache_tokens) for
//! read/write-through.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, PoisonError};

use regex::Regex;
use tracing::{debug, trace, warn};

use crate::http::BoxFuture;

/// Characters that may not appear in a cache file name.
static UNSAFE_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex"));

/// Key-value storage for access tokens.
///
/// `set` and `delete` report success as a boolean rather than an error:
/// the client decides what a failed delete means.
pub trait TokenCache: Send + Sync {
    /// Returns the value stored under `key`.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<String>>;

    /// Stores `value` under `key`.
    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, bool>;

    /// Removes `key`. Removing a key that is not present succeeds.
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool>;
}

/// In-process cache.
#[derive(Debug, Default)]
pub struct MemoryTokenCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenCache for MemoryTokenCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<String>> {
        let value = self.entries().get(key).cloned();
        Box::pin(async move { value })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, bool> {
        self.entries().insert(key.to_string(), value.to_string());
        Box::pin(async { true })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool> {
        self.entries().remove(key);
        Box::pin(async { true })
    }
}

/// Cache storing one file per key in a directory.
///
/// Writes go through a temporary file and a rename so readers never see a
/// partial token. On unix the files are created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    dir: PathBuf,
}

impl FileTokenCache {
    /// Creates a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a cache under the system temporary directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("chronofy"))
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name = UNSAFE_KEY_CHARS.replace_all(key, "_");
        self.dir.join(format!("{}.token", name))
    }

    async fn read(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => {
                trace!(path = %path.display(), "token cache hit");
                Some(value)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read token cache");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let temp_path = path.with_extension("token.tmp");
        tokio::fs::write(&temp_path, value).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        tokio::fs::rename(&temp_path, &path).await?;
        debug!(path = %path.display(), "stored token");
        Ok(())
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed token");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl TokenCache for FileTokenCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(self.read(key))
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            match self.write(key, value).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(key = %key, error = %e, "failed to write token cache");
                    false
                }
            }
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            match self.remove(key).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(key = %key, error = %e, "failed to delete token cache entry");
                    false
                }
            }
        })
    }
}
