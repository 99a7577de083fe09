use std::sync::Arc;

use super::uri::{self, Scheme};
use super::{FileObject, FileSystem, FsOptions, HttpFileSystem, LocalFileSystem, RamFileSystem};
use crate::error::{Error, Result};

/// Resolves locations to [`FileObject`]s on the matching backend.
///
/// One manager owns one instance of each backend, so every `ram://`
/// location resolved through it shares the same in-memory tree.
pub struct FileSystemManager {
    options: FsOptions,
    local: Arc<LocalFileSystem>,
    ram: Arc<RamFileSystem>,
    http: Arc<HttpFileSystem>,
}

impl FileSystemManager {
    pub fn new(options: FsOptions) -> Result<Self> {
        let http = Arc::new(HttpFileSystem::new(&options)?);
        Ok(Self {
            options,
            local: Arc::new(LocalFileSystem::new()),
            ram: Arc::new(RamFileSystem::new()),
            http,
        })
    }

    pub fn options(&self) -> &FsOptions {
        &self.options
    }

    pub fn resolve(&self, location: &str) -> Result<FileObject> {
        let parsed = uri::parse(location)?;
        let fs: Arc<dyn FileSystem> = match parsed.scheme {
            Scheme::File => self.local.clone(),
            Scheme::Ram => self.ram.clone(),
            Scheme::Http => self.http.clone(),
            Scheme::Other(scheme) => return Err(Error::UnsupportedScheme(scheme)),
        };
        tracing::trace!(location, scheme = fs.scheme(), "resolved");
        Ok(FileObject::new(fs, parsed.path))
    }
}
