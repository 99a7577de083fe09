use async_trait::async_trait;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use super::ReadAt;
use crate::error::{Error, Result};

/// Positional reads on a local file, run on tokio's blocking pool.
pub struct LocalFileReader {
    file: Arc<File>,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file: Arc::new(file),
            size,
        })
    }
}

#[cfg(unix)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

// seek_read moves the shared cursor; nothing here relies on it
#[cfg(windows)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(not(any(unix, windows)))]
fn pread(_file: &File, _buf: &mut [u8], _offset: u64) -> std::io::Result<usize> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "positional reads are not supported on this platform",
    ))
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }
        let file = Arc::clone(&self.file);
        let len = buf.len();
        let chunk = tokio::task::spawn_blocking(move || {
            let mut chunk = vec![0u8; len];
            let n = pread(&file, &mut chunk, offset)?;
            chunk.truncate(n);
            Ok::<_, std::io::Error>(chunk)
        })
        .await
        .map_err(|e| Error::Message(format!("read task failed: {e}")))??;

        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }

    fn size(&self) -> u64 {
        self.size
    }
}
