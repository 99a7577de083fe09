use crate::error::{Error, Result};
use crate::vfs::FileObject;
use crate::zip::ZipExtractor;

use super::ListedEntry;

/// Normalise a stored entry name to a relative `/`-separated path.
///
/// Backslashes count as separators; empty and `.` segments are dropped.
/// Absolute names, drive prefixes and `..` segments are refused.
pub fn sanitize_entry_name(name: &str) -> Result<String> {
    let unsafe_name = || Error::UnsafeEntryName(name.to_string());
    let unified = name.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(unsafe_name());
    }
    let bytes = unified.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Err(unsafe_name());
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(unsafe_name()),
            _ => segments.push(segment),
        }
    }
    Ok(segments.join("/"))
}

/// Extract every entry of the archive at `source` below `destination`.
///
/// All names are checked before anything is written, so an archive with a
/// single unsafe name leaves the destination untouched.
pub async fn unzip(source: &FileObject, destination: &FileObject) -> Result<Vec<ListedEntry>> {
    if !source.exists().await? {
        return Err(Error::NotFound(source.uri()));
    }
    let extractor = ZipExtractor::new(source.random_reader().await?);
    let entries = extractor.list_files().await?;

    let mut planned = Vec::with_capacity(entries.len());
    for entry in &entries {
        let name = sanitize_entry_name(&entry.file_name)?;
        if name.is_empty() {
            tracing::debug!(entry = %entry.file_name, "skipping entry with an empty name");
            continue;
        }
        planned.push((entry, name));
    }

    destination.create_folder().await?;
    let mut extracted = Vec::with_capacity(planned.len());
    for (entry, name) in planned {
        let target = destination.resolve_relative(&name);
        if entry.is_directory {
            target.create_folder().await?;
            extracted.push(ListedEntry::directory(name));
        } else {
            let written = extractor.extract_to_file(entry, &target).await?;
            tracing::trace!(entry = %name, bytes = written, "extracted");
            extracted.push(ListedEntry::file(name));
        }
    }
    tracing::debug!(
        source = %source.uri(),
        destination = %destination.uri(),
        entries = extracted.len(),
        "unzipped"
    );
    Ok(extracted)
}
