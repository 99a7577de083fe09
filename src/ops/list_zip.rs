use crate::error::{Error, Result};
use crate::vfs::FileObject;
use crate::zip::ZipExtractor;

/// Names of the file entries of the archive at `source`, in central
/// directory order.
pub async fn list_zip(source: &FileObject) -> Result<Vec<String>> {
    if !source.exists().await? {
        return Err(Error::NotFound(source.uri()));
    }
    let extractor = ZipExtractor::new(source.random_reader().await?);
    Ok(extractor
        .list_files()
        .await?
        .into_iter()
        .filter(|entry| !entry.is_directory)
        .map(|entry| entry.file_name)
        .collect())
}
