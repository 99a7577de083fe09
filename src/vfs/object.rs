use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::{BoxFuture, FileKind, FileSystem, ReadStream, SEPARATORS, WriteStream};
use crate::error::{Error, Result};
use crate::io::ReadAt;

/// Handle on one node of a backend.
///
/// Cheap to clone; resolving a handle does not touch the backend, so the
/// node may or may not exist.
#[derive(Clone)]
pub struct FileObject {
    fs: Arc<dyn FileSystem>,
    path: String,
}

impl fmt::Debug for FileObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FileObject").field(&self.uri()).finish()
    }
}

impl FileObject {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<String>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn uri(&self) -> String {
        self.fs.uri(&self.path)
    }

    /// Last path segment, ignoring trailing separators
    pub fn base_name(&self) -> &str {
        self.path
            .trim_end_matches(SEPARATORS)
            .rsplit(SEPARATORS)
            .next()
            .unwrap_or("")
    }

    /// Text after the last `.` of the base name, empty when there is none
    pub fn extension(&self) -> &str {
        let base = self.base_name();
        base.rfind('.').map(|i| &base[i + 1..]).unwrap_or("")
    }

    pub fn child(&self, name: &str) -> FileObject {
        FileObject {
            fs: Arc::clone(&self.fs),
            path: self.fs.join(&self.path, name),
        }
    }

    /// Resolve a `/`-separated relative path below this node.
    pub fn resolve_relative(&self, relative: &str) -> FileObject {
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.clone(), |node, segment| node.child(segment))
    }

    /// Path of `descendant` relative to this node, `/`-separated.
    ///
    /// Fails if `descendant` is not strictly below this node.
    pub fn relative_name(&self, descendant: &FileObject) -> Result<String> {
        let root = self.path.trim_end_matches(SEPARATORS);
        let rest = descendant
            .path
            .strip_prefix(root)
            .filter(|rest| rest.starts_with(SEPARATORS))
            .ok_or_else(|| {
                Error::Message(format!(
                    "`{}` is not below `{}`",
                    descendant.uri(),
                    self.uri()
                ))
            })?;
        let name = rest
            .split(SEPARATORS)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        if name.is_empty() {
            return Err(Error::Message(format!(
                "`{}` has no name relative to `{}`",
                descendant.uri(),
                self.uri()
            )));
        }
        Ok(name)
    }

    /// True when both handles talk to the same backend instance.
    pub fn same_file_system(&self, other: &FileObject) -> bool {
        Arc::ptr_eq(&self.fs, &other.fs)
    }

    /// True when both handles name the same path on the same backend.
    pub fn is_same_node(&self, other: &FileObject) -> bool {
        self.same_file_system(other) && self.path == other.path
    }

    pub async fn kind(&self) -> Result<Option<FileKind>> {
        self.fs.kind(&self.path).await
    }

    pub async fn exists(&self) -> Result<bool> {
        Ok(self.kind().await?.is_some())
    }

    /// Immediate children, sorted by base name.
    pub async fn children(&self) -> Result<Vec<FileObject>> {
        let names = self.fs.list(&self.path).await?;
        Ok(names.iter().map(|name| self.child(name)).collect())
    }

    pub async fn reader(&self) -> Result<ReadStream> {
        self.fs.open_read(&self.path).await
    }

    pub async fn random_reader(&self) -> Result<Arc<dyn ReadAt>> {
        self.fs.open_random(&self.path).await
    }

    pub async fn writer(&self, append: bool) -> Result<WriteStream> {
        self.fs.open_write(&self.path, append).await
    }

    pub async fn create_file(&self) -> Result<()> {
        self.fs.create_file(&self.path).await
    }

    pub async fn create_folder(&self) -> Result<()> {
        self.fs.create_folder(&self.path).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.fs.delete(&self.path).await
    }

    /// Write `data` to the file, truncating or appending.
    pub async fn write_all(&self, data: &[u8], append: bool) -> Result<()> {
        let mut writer = self.writer(append).await?;
        writer.write_all(data).await?;
        writer.shutdown().await?;
        Ok(())
    }

    /// Copy `source` onto this node.
    ///
    /// A file is streamed; a folder is recreated here with all of its
    /// content. Returns the number of bytes copied.
    pub fn copy_from<'a>(&'a self, source: &'a FileObject) -> BoxFuture<'a, Result<u64>> {
        Box::pin(async move {
            match source.kind().await? {
                None => Err(Error::NotFound(source.uri())),
                Some(FileKind::File) => {
                    let mut reader = source.reader().await?;
                    let mut writer = self.writer(false).await?;
                    let copied = pump(&mut reader, &mut writer).await?;
                    writer.shutdown().await?;
                    Ok(copied)
                }
                Some(FileKind::Folder) => {
                    self.create_folder().await?;
                    let mut copied = 0;
                    for child in source.children().await? {
                        copied += self.child(child.base_name()).copy_from(&child).await?;
                    }
                    Ok(copied)
                }
            }
        })
    }

    /// Move this node to `dest`, replacing whatever `dest` holds.
    ///
    /// Renames within one backend, otherwise copies and deletes.
    pub async fn move_to(&self, dest: &FileObject) -> Result<()> {
        if self.is_same_node(dest) {
            return Ok(());
        }
        if dest.exists().await? {
            dest.delete().await?;
        }
        if self.same_file_system(dest) {
            self.fs.rename(&self.path, &dest.path).await
        } else {
            dest.copy_from(self).await?;
            self.delete().await
        }
    }
}

/// Copy `reader` into `writer` through a [`BUFFER_SIZE`](super::BUFFER_SIZE)
/// buffer until end of stream.
pub(crate) async fn pump(reader: &mut ReadStream, writer: &mut WriteStream) -> Result<u64> {
    let mut buf = vec![0u8; super::BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(total);
        }
        writer.write_all(&buf[..n]).await?;
        total += n as u64;
    }
}
