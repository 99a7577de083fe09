//! Recursive archiver: packs a file or a whole folder tree into one zip.
//!
//! Failures are isolated per file. A source file that cannot be opened or
//! read is logged, left out (or truncated if its entry was already open)
//! and reported in [`ArchiveReport::skipped`]; the archive as a whole still
//! succeeds. Only a missing source or a destination that cannot be opened
//! or finalised fails the operation.

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWrite};

use crate::error::{Error, Result};
use crate::vfs::{BUFFER_SIZE, BoxFuture, FileKind, FileObject};
use crate::zip::ZipWriter;

/// An entry that did not make it into an archive intact, with the reason.
///
/// `truncated` entries are present in the archive with the data read
/// before the failure; the others are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: String,
    #[serde(skip_serializing_if = "is_false")]
    pub truncated: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SkippedEntry {
    pub fn new(name: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            name: name.into(),
            reason: reason.to_string(),
            truncated: false,
        }
    }
}

/// What an archive run wrote and what it had to skip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveReport {
    pub entries: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
}

impl ArchiveReport {
    /// Record a failed entry, noting whether the writer already holds it.
    fn skip<W: AsyncWrite + Unpin>(&mut self, zip: &ZipWriter<W>, name: String, error: &Error) {
        let truncated = zip.entry_names().any(|written| written == name);
        self.skipped.push(SkippedEntry {
            truncated,
            ..SkippedEntry::new(name, error)
        });
    }
}

/// Every node below `root`, depth first, each folder listed before its
/// content.
///
/// A folder whose children cannot be listed contributes no children; the
/// walk carries on with its siblings.
pub async fn collect_descendants(root: &FileObject) -> Vec<FileObject> {
    let mut found = Vec::new();
    collect_into(root, &mut found).await;
    found
}

fn collect_into<'a>(dir: &'a FileObject, found: &'a mut Vec<FileObject>) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let children = match dir.children().await {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!(folder = %dir.uri(), "unable to list folder: {e}");
                return;
            }
        };
        for child in children {
            let is_folder = matches!(child.kind().await, Ok(Some(FileKind::Folder)));
            found.push(child.clone());
            if is_folder {
                collect_into(&child, found).await;
            }
        }
    })
}

/// Copy `file` into a new entry called `name`.
///
/// The source is opened before the entry so that an unreadable file leaves
/// no trace in the archive. A read failure after that point still closes
/// the entry, keeping the archive well formed.
async fn write_entry<W: AsyncWrite + Unpin>(
    zip: &mut ZipWriter<W>,
    file: &FileObject,
    name: &str,
    buf: &mut [u8],
) -> Result<()> {
    let mut reader = file.reader().await?;
    zip.start_file(name).await?;
    let copied = async {
        loop {
            let n = reader.read(buf).await?;
            if n == 0 {
                return Ok::<(), Error>(());
            }
            zip.write(&buf[..n]).await?;
        }
    }
    .await;
    let closed = zip.finish_entry().await;
    copied.and(closed)
}

/// Add one descendant of `root` under its root-relative name.
///
/// Returns the entry name on success.
pub async fn add_to_zip<W: AsyncWrite + Unpin>(
    root: &FileObject,
    file: &FileObject,
    zip: &mut ZipWriter<W>,
    buf: &mut [u8],
) -> Result<String> {
    let name = root.relative_name(file)?;
    write_entry(zip, file, &name, buf).await?;
    Ok(name)
}

/// Archive `source` (file or folder) into a zip written to `destination`.
///
/// The destination is overwritten. Folders contribute no entries of their
/// own; only files do. The source is listed before the destination is
/// opened, and the destination itself is never added, so an archive may
/// live inside the folder it packs.
pub async fn archive(source: &FileObject, destination: &FileObject) -> Result<ArchiveReport> {
    let kind = source
        .kind()
        .await?
        .ok_or_else(|| Error::NotFound(source.uri()))?;
    let nodes = match kind {
        FileKind::File => Vec::new(),
        FileKind::Folder => collect_descendants(source).await,
    };

    let out = destination.writer(false).await?;
    let mut zip = ZipWriter::new(out);
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut report = ArchiveReport::default();

    if kind == FileKind::File {
        let name = source.base_name().to_string();
        match write_entry(&mut zip, source, &name, &mut buf).await {
            Ok(()) => report.entries.push(name),
            Err(e) => {
                tracing::error!(file = %source.uri(), "unable to compress file: {e}");
                report.skip(&zip, name, &e);
            }
        }
    }

    for node in nodes {
        if node.is_same_node(destination) {
            continue;
        }
        match node.kind().await {
            Ok(Some(FileKind::File)) => {}
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(node = %node.uri(), "unable to stat: {e}");
                report.skipped.push(SkippedEntry::new(node.uri(), e));
                continue;
            }
        }
        match add_to_zip(source, &node, &mut zip, &mut buf).await {
            Ok(name) => report.entries.push(name),
            Err(e) => {
                tracing::error!(file = %node.uri(), "unable to add file to zip: {e}");
                let name = source.relative_name(&node).unwrap_or_else(|_| node.uri());
                report.skip(&zip, name, &e);
            }
        }
    }

    zip.finish().await?;
    tracing::debug!(
        source = %source.uri(),
        destination = %destination.uri(),
        entries = report.entries.len(),
        skipped = report.skipped.len(),
        "archive written"
    );
    Ok(report)
}
