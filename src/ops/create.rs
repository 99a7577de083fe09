use crate::encoding;
use crate::error::Result;
use crate::vfs::FileObject;

/// Create a file or folder at `target`.
///
/// A base name without an extension denotes a folder, created together with
/// its parents. Otherwise the file is created, and when `content` is given
/// it replaces whatever the file held.
pub async fn create(target: &FileObject, content: Option<&str>, encoding: Option<&str>) -> Result<()> {
    if target.extension().is_empty() {
        tracing::debug!(folder = %target.uri(), "creating folder");
        return target.create_folder().await;
    }
    match content {
        None => target.create_file().await,
        Some(content) => {
            let bytes = encoding::encode(content, encoding)?;
            target.write_all(&bytes, false).await
        }
    }
}
