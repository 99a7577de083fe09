use crate::error::{Error, Result};
use crate::vfs::FileObject;

/// Delete a file, or a folder with everything below it.
pub async fn delete(target: &FileObject) -> Result<()> {
    if !target.exists().await? {
        return Err(Error::NotFound(target.uri()));
    }
    target.delete().await
}
