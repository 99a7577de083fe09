//! Virtual file system.
//!
//! Every backend implements [`FileSystem`] over its own native path strings.
//! Callers never talk to a backend directly: they resolve a URI through a
//! [`FileSystemManager`] and work with the returned [`FileObject`], which
//! carries the backend handle and the path together.
//!
//! ## Backends
//!
//! | URI | Backend |
//! |---|---|
//! | `/tmp/x`, `C:\x`, `file:///tmp/x` | [`LocalFileSystem`] |
//! | `ram:///x` | [`RamFileSystem`], one per manager |
//! | `http://…`, `https://…` | [`HttpFileSystem`], read-only |
//!
//! Any other scheme (`ftp`, `sftp`, …) fails to resolve with
//! [`Error::UnsupportedScheme`](crate::Error::UnsupportedScheme).

mod http;
mod local;
mod manager;
mod object;
mod ram;
pub mod uri;

pub use http::HttpFileSystem;
pub use local::LocalFileSystem;
pub use manager::FileSystemManager;
pub use object::FileObject;
pub use ram::RamFileSystem;

use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::io::ReadAt;

/// Size of the intermediate buffer used for every stream-to-stream copy.
pub const BUFFER_SIZE: usize = 32 * 1024;

/// Path separators accepted in backend paths.
pub(crate) const SEPARATORS: [char; 2] = ['/', '\\'];

pub type ReadStream = Box<dyn AsyncRead + Send + Unpin>;
pub type WriteStream = Box<dyn AsyncWrite + Send + Unpin>;
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Kind of an existing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Folder,
}

/// Transport options shared by every backend a manager hands out.
#[derive(Debug, Clone)]
pub struct FsOptions {
    /// Per-request timeout for the HTTP backend
    pub http_timeout: Duration,
    /// Reconnect attempts for HTTP range reads before giving up
    pub http_max_retry: u32,
}

impl Default for FsOptions {
    fn default() -> Self {
        Self {
            http_timeout: Duration::from_secs(30),
            http_max_retry: 10,
        }
    }
}

/// Capabilities a storage backend provides.
///
/// Paths are backend-native strings. Writers create missing parent folders.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// URI scheme the backend is registered under
    fn scheme(&self) -> &'static str;

    /// Render `path` as a URI for messages and results
    fn uri(&self, path: &str) -> String;

    /// Path of the child `name` inside `parent`
    fn join(&self, parent: &str, name: &str) -> String {
        let trimmed = parent.trim_end_matches(SEPARATORS);
        format!("{trimmed}/{name}")
    }

    /// Kind of the node at `path`, `None` if it does not exist
    async fn kind(&self, path: &str) -> Result<Option<FileKind>>;

    /// Base names of the immediate children of a folder, sorted
    async fn list(&self, path: &str) -> Result<Vec<String>>;

    /// Sequential read stream over a file's content
    async fn open_read(&self, path: &str) -> Result<ReadStream>;

    /// Random-access reader over a file's content
    async fn open_random(&self, path: &str) -> Result<Arc<dyn ReadAt>>;

    /// Write stream; truncates unless `append` is set
    async fn open_write(&self, path: &str, append: bool) -> Result<WriteStream>;

    /// Create an empty file if nothing exists at `path`
    async fn create_file(&self, path: &str) -> Result<()>;

    /// Create a folder and any missing parents
    async fn create_folder(&self, path: &str) -> Result<()>;

    /// Remove a file, or a folder with everything below it
    async fn delete(&self, path: &str) -> Result<()>;

    /// Rename within this backend; `to` must not exist
    async fn rename(&self, from: &str, to: &str) -> Result<()>;
}
