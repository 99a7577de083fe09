use serde::Serialize;

use crate::error::{Error, Result};
use crate::pattern::FilePattern;
use crate::vfs::{FileKind, FileObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One name reported by search, unzip or list-zip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl ListedEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }
}

/// List the immediate children of `source` whose base names match: files
/// against `file_pattern`, folders against `dir_pattern`.
pub async fn search(
    source: &FileObject,
    file_pattern: Option<&FilePattern>,
    dir_pattern: Option<&FilePattern>,
) -> Result<Vec<ListedEntry>> {
    if file_pattern.is_none() && dir_pattern.is_none() {
        return Err(Error::Message(
            "at least one of filePattern or dirPattern is required".to_string(),
        ));
    }
    if !source.exists().await? {
        return Err(Error::NotFound(source.uri()));
    }

    let mut found = Vec::new();
    for child in source.children().await? {
        let name = child.base_name();
        match child.kind().await? {
            Some(FileKind::File) if file_pattern.is_some_and(|p| p.matches(name)) => {
                found.push(ListedEntry::file(name));
            }
            Some(FileKind::Folder) if dir_pattern.is_some_and(|p| p.matches(name)) => {
                found.push(ListedEntry::directory(name));
            }
            _ => {}
        }
    }
    Ok(found)
}
