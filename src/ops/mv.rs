use crate::error::{Error, Result};
use crate::vfs::{FileKind, FileObject};

/// Move `source` into the folder `destination`.
///
/// A folder takes the place of `destination`; a file lands in
/// `destination/<base name>`, replacing any file already there.
pub async fn move_into(source: &FileObject, destination: &FileObject) -> Result<()> {
    let kind = source
        .kind()
        .await?
        .ok_or_else(|| Error::NotFound(source.uri()))?;
    if !destination.exists().await? {
        destination.create_folder().await?;
    }
    let target = match kind {
        FileKind::Folder => destination.clone(),
        FileKind::File => destination.child(source.base_name()),
    };
    tracing::debug!(from = %source.uri(), to = %target.uri(), "moving");
    source.move_to(&target).await
}
