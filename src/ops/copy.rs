use crate::archive::SkippedEntry;
use crate::error::{Error, Result};
use crate::pattern::FilePattern;
use crate::vfs::{FileKind, FileObject};

/// Copy `source` into the folder `destination`.
///
/// Without a pattern a file lands in `destination/<base name>` and a folder
/// has its whole content copied into `destination`.
///
/// With a pattern, matching files directly inside `source` or inside one of
/// its immediate sub-folders are copied flat into `destination`. Files that
/// fail to copy are returned as skipped; the rest still go through.
pub async fn copy(
    source: &FileObject,
    destination: &FileObject,
    pattern: Option<&FilePattern>,
) -> Result<Vec<SkippedEntry>> {
    let kind = source
        .kind()
        .await?
        .ok_or_else(|| Error::NotFound(source.uri()))?;

    let Some(pattern) = pattern else {
        let copied = match kind {
            FileKind::File => destination.child(source.base_name()).copy_from(source).await?,
            FileKind::Folder => destination.copy_from(source).await?,
        };
        tracing::debug!(from = %source.uri(), to = %destination.uri(), bytes = copied, "copied");
        return Ok(Vec::new());
    };

    if kind != FileKind::Folder {
        return Err(Error::NotAFolder(source.uri()));
    }

    let mut folders = vec![source.clone()];
    for child in source.children().await? {
        if child.kind().await? == Some(FileKind::Folder) {
            folders.push(child);
        }
    }

    let mut skipped = Vec::new();
    for folder in &folders {
        let children = match folder.children().await {
            Ok(children) => children,
            Err(e) => {
                tracing::error!(folder = %folder.uri(), "unable to list folder: {e}");
                skipped.push(SkippedEntry::new(folder.uri(), e));
                continue;
            }
        };
        for child in children {
            if !pattern.matches(child.base_name()) {
                continue;
            }
            let outcome = match child.kind().await {
                Ok(Some(FileKind::File)) => destination
                    .child(child.base_name())
                    .copy_from(&child)
                    .await
                    .map(drop),
                Ok(_) => continue,
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                tracing::error!(file = %child.uri(), "error occurred while copying a file: {e}");
                skipped.push(SkippedEntry::new(child.uri(), e));
            }
        }
    }
    Ok(skipped)
}
