use crate::encoding;
use crate::error::Result;
use crate::vfs::FileObject;

/// Append `content` to `target`, creating the file if needed.
pub async fn append(target: &FileObject, content: &str, encoding: Option<&str>) -> Result<()> {
    let bytes = encoding::encode(content, encoding)?;
    target.write_all(&bytes, true).await
}
