use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

use super::{FileKind, FileSystem, ReadStream, WriteStream};
use crate::error::{Error, Result};
use crate::io::{LocalFileReader, ReadAt};

/// Backend for the local disk.
#[derive(Debug, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

/// Map `NotFound` to a path-carrying error; keep everything else as I/O.
fn io_error(path: &str, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::NotFound(path.to_string())
    } else {
        Error::Io(err)
    }
}

async fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    fn scheme(&self) -> &'static str {
        "file"
    }

    fn uri(&self, path: &str) -> String {
        path.to_string()
    }

    async fn kind(&self, path: &str) -> Result<Option<FileKind>> {
        match fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => Ok(Some(FileKind::Folder)),
            Ok(_) => Ok(Some(FileKind::File)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let mut dir = fs::read_dir(path).await.map_err(|e| io_error(path, e))?;
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn open_read(&self, path: &str) -> Result<ReadStream> {
        let file = fs::File::open(path).await.map_err(|e| io_error(path, e))?;
        Ok(Box::new(file))
    }

    async fn open_random(&self, path: &str) -> Result<Arc<dyn ReadAt>> {
        let reader = LocalFileReader::new(Path::new(path)).map_err(|e| match e {
            Error::Io(io) => io_error(path, io),
            other => other,
        })?;
        Ok(Arc::new(reader))
    }

    async fn open_write(&self, path: &str, append: bool) -> Result<WriteStream> {
        create_parent(Path::new(path)).await?;
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .await?;
        Ok(Box::new(file))
    }

    async fn create_file(&self, path: &str) -> Result<()> {
        create_parent(Path::new(path)).await?;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let meta = fs::symlink_metadata(path)
            .await
            .map_err(|e| io_error(path, e))?;
        if meta.is_dir() {
            fs::remove_dir_all(path).await?;
        } else {
            fs::remove_file(path).await?;
        }
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        create_parent(Path::new(to)).await?;
        fs::rename(from, to).await.map_err(|e| io_error(from, e))
    }
}
