use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

use super::{FileKind, FileSystem, ReadStream, WriteStream};
use crate::error::{Error, Result};
use crate::io::{MemoryReader, ReadAt};

#[derive(Debug, Clone)]
enum RamNode {
    Folder,
    File(Vec<u8>),
}

type Nodes = BTreeMap<String, RamNode>;

/// In-process backend for `ram://` URIs.
///
/// Paths are normalised to `/a/b` form. The root folder always exists.
#[derive(Debug, Clone)]
pub struct RamFileSystem {
    nodes: Arc<Mutex<Nodes>>,
}

impl Default for RamFileSystem {
    fn default() -> Self {
        let mut nodes = Nodes::new();
        nodes.insert("/".to_string(), RamNode::Folder);
        Self {
            nodes: Arc::new(Mutex::new(nodes)),
        }
    }
}

/// Normalise to a rooted, `/`-separated path without `.`/`..` segments.
pub(crate) fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split(super::SEPARATORS) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}

fn parent_of(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) if path.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(i) => Some(&path[..i]),
    }
}

fn child_prefix(path: &str) -> String {
    if path == "/" {
        "/".to_string()
    } else {
        format!("{path}/")
    }
}

fn lock(nodes: &Mutex<Nodes>) -> Result<MutexGuard<'_, Nodes>> {
    nodes
        .lock()
        .map_err(|_| Error::Message("RAM file system lock poisoned".to_string()))
}

/// Insert any missing ancestors of `path` as folders.
fn ensure_parents(nodes: &mut Nodes, path: &str) -> Result<()> {
    let mut ancestors = Vec::new();
    let mut cur = parent_of(path);
    while let Some(p) = cur {
        ancestors.push(p.to_string());
        cur = parent_of(p);
    }
    for ancestor in ancestors.into_iter().rev() {
        match nodes.get(&ancestor) {
            Some(RamNode::Folder) => {}
            Some(RamNode::File(_)) => return Err(Error::NotAFolder(ancestor)),
            None => {
                nodes.insert(ancestor, RamNode::Folder);
            }
        }
    }
    Ok(())
}

impl RamFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let path = normalize(path);
        let nodes = lock(&self.nodes)?;
        match nodes.get(&path) {
            Some(RamNode::File(data)) => Ok(data.clone()),
            Some(RamNode::Folder) => Err(Error::Message(format!("`ram://{path}` is a folder"))),
            None => Err(Error::NotFound(format!("ram://{path}"))),
        }
    }
}

#[async_trait]
impl FileSystem for RamFileSystem {
    fn scheme(&self) -> &'static str {
        "ram"
    }

    fn uri(&self, path: &str) -> String {
        format!("ram://{}", normalize(path))
    }

    async fn kind(&self, path: &str) -> Result<Option<FileKind>> {
        let nodes = lock(&self.nodes)?;
        Ok(nodes.get(&normalize(path)).map(|node| match node {
            RamNode::Folder => FileKind::Folder,
            RamNode::File(_) => FileKind::File,
        }))
    }

    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let path = normalize(path);
        let nodes = lock(&self.nodes)?;
        match nodes.get(&path) {
            Some(RamNode::Folder) => {}
            Some(RamNode::File(_)) => return Err(Error::NotAFolder(format!("ram://{path}"))),
            None => return Err(Error::NotFound(format!("ram://{path}"))),
        }
        let prefix = child_prefix(&path);
        Ok(nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| {
                let rest = &key[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect())
    }

    async fn open_read(&self, path: &str) -> Result<ReadStream> {
        Ok(Box::new(Cursor::new(self.read_file(path)?)))
    }

    async fn open_random(&self, path: &str) -> Result<Arc<dyn ReadAt>> {
        Ok(Arc::new(MemoryReader::new(self.read_file(path)?)))
    }

    async fn open_write(&self, path: &str, append: bool) -> Result<WriteStream> {
        let path = normalize(path);
        {
            let mut nodes = lock(&self.nodes)?;
            ensure_parents(&mut nodes, &path)?;
            match nodes.get_mut(&path) {
                Some(RamNode::Folder) => {
                    return Err(Error::Message(format!("`ram://{path}` is a folder")));
                }
                Some(RamNode::File(data)) => {
                    if !append {
                        data.clear();
                    }
                }
                None => {
                    nodes.insert(path.clone(), RamNode::File(Vec::new()));
                }
            }
        }
        Ok(Box::new(RamWriter {
            nodes: Arc::clone(&self.nodes),
            path,
        }))
    }

    async fn create_file(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut nodes = lock(&self.nodes)?;
        ensure_parents(&mut nodes, &path)?;
        nodes.entry(path).or_insert_with(|| RamNode::File(Vec::new()));
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut nodes = lock(&self.nodes)?;
        ensure_parents(&mut nodes, &path)?;
        match nodes.get(&path) {
            Some(RamNode::File(_)) => Err(Error::Message(format!(
                "`ram://{path}` already exists as a file"
            ))),
            Some(RamNode::Folder) => Ok(()),
            None => {
                nodes.insert(path, RamNode::Folder);
                Ok(())
            }
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut nodes = lock(&self.nodes)?;
        if !nodes.contains_key(&path) {
            return Err(Error::NotFound(format!("ram://{path}")));
        }
        let prefix = child_prefix(&path);
        nodes.retain(|key, _| key == "/" || !key.starts_with(&prefix));
        if path != "/" {
            nodes.remove(&path);
        }
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let (from, to) = (normalize(from), normalize(to));
        let mut nodes = lock(&self.nodes)?;
        if !nodes.contains_key(&from) {
            return Err(Error::NotFound(format!("ram://{from}")));
        }
        if nodes.contains_key(&to) {
            return Err(Error::Message(format!("`ram://{to}` already exists")));
        }
        let from_prefix = child_prefix(&from);
        if to.starts_with(&from_prefix) || from == "/" {
            return Err(Error::Message(format!(
                "cannot move `ram://{from}` below itself"
            )));
        }
        ensure_parents(&mut nodes, &to)?;

        let moved: Vec<String> = nodes
            .keys()
            .filter(|key| **key == from || key.starts_with(&from_prefix))
            .cloned()
            .collect();
        for key in moved {
            if let Some(node) = nodes.remove(&key) {
                let new_key = format!("{to}{}", &key[from.len()..]);
                nodes.insert(new_key, node);
            }
        }
        Ok(())
    }
}

/// Write handle appending straight into the shared node map.
struct RamWriter {
    nodes: Arc<Mutex<Nodes>>,
    path: String,
}

impl AsyncWrite for RamWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let mut nodes = match self.nodes.lock() {
            Ok(nodes) => nodes,
            Err(_) => return Poll::Ready(Err(std::io::Error::other("RAM file system lock poisoned"))),
        };
        match nodes.get_mut(&self.path) {
            Some(RamNode::File(data)) => {
                data.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            }
            _ => Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("ram://{} was removed while open", self.path),
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn normalize_paths() {
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("a/b/"), "/a/b");
        assert_eq!(normalize("//a/./b\\c"), "/a/b/c");
        assert_eq!(normalize("/a/../b"), "/b");
    }

    #[tokio::test]
    async fn write_creates_parents_and_lists_children() {
        let fs = RamFileSystem::new();
        let mut w = fs.open_write("/docs/sub/a.txt", false).await.unwrap();
        w.write_all(b"abc").await.unwrap();
        w.shutdown().await.unwrap();
        fs.create_file("/docs/b.txt").await.unwrap();

        assert_eq!(fs.kind("/docs").await.unwrap(), Some(FileKind::Folder));
        assert_eq!(fs.list("/docs").await.unwrap(), vec!["b.txt", "sub"]);
        assert_eq!(fs.list("/").await.unwrap(), vec!["docs"]);

        let mut out = Vec::new();
        fs.open_read("/docs/sub/a.txt")
            .await
            .unwrap()
            .read_to_end(&mut out)
            .await
            .unwrap();
        assert_eq!(out, b"abc");
    }

    #[tokio::test]
    async fn rename_moves_subtree() {
        let fs = RamFileSystem::new();
        fs.create_file("/src/a/1.txt").await.unwrap();
        fs.create_file("/src/2.txt").await.unwrap();
        fs.rename("/src", "/dst/moved").await.unwrap();

        assert_eq!(fs.kind("/src").await.unwrap(), None);
        assert_eq!(fs.list("/dst/moved").await.unwrap(), vec!["2.txt", "a"]);
        assert_eq!(
            fs.kind("/dst/moved/a/1.txt").await.unwrap(),
            Some(FileKind::File)
        );
        assert!(fs.rename("/dst", "/dst/moved/inner").await.is_err());
    }

    #[tokio::test]
    async fn delete_removes_subtree_only() {
        let fs = RamFileSystem::new();
        fs.create_file("/a/x.txt").await.unwrap();
        fs.create_file("/ab.txt").await.unwrap();
        fs.delete("/a").await.unwrap();
        assert_eq!(fs.list("/").await.unwrap(), vec!["ab.txt"]);
        assert!(fs.delete("/a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn file_cannot_hold_children() {
        let fs = RamFileSystem::new();
        fs.create_file("/f").await.unwrap();
        assert!(matches!(
            fs.create_file("/f/g").await,
            Err(Error::NotAFolder(_))
        ));
        assert!(matches!(fs.list("/f").await, Err(Error::NotAFolder(_))));
    }
}
