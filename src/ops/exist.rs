use crate::error::Result;
use crate::vfs::FileObject;

pub async fn exists(target: &FileObject) -> Result<bool> {
    let found = target.exists().await?;
    tracing::debug!(location = %target.uri(), found, "existence check");
    Ok(found)
}
