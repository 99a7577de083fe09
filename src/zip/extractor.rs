use flate2::Crc;
use flate2::write::DeflateDecoder;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::io::ReadAt;
use crate::vfs::{BUFFER_SIZE, FileObject};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt + ?Sized> {
    parser: ZipParser<R>,
}

/// Output side of one entry: tracks CRC and size of what was written.
struct Sink<'a, W: AsyncWrite + Unpin> {
    out: &'a mut W,
    crc: Crc,
    written: u64,
}

impl<W: AsyncWrite + Unpin> Sink<'_, W> {
    async fn emit(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.crc.update(data);
        self.out.write_all(data).await?;
        self.written += data.len() as u64;
        Ok(())
    }
}

impl<R: ReadAt + ?Sized> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Stream an entry's decompressed content into `out`.
    ///
    /// Data is read in [`BUFFER_SIZE`] chunks; the CRC-32 and size recorded
    /// in the central directory are checked once the entry is exhausted.
    pub async fn extract_into<W: AsyncWrite + Unpin>(
        &self,
        entry: &ZipFileEntry,
        out: &mut W,
    ) -> Result<u64> {
        let mut inflater = match entry.compression_method {
            CompressionMethod::Stored => None,
            CompressionMethod::Deflate => Some(DeflateDecoder::new(Vec::new())),
            CompressionMethod::Unknown(method) => {
                return Err(Error::UnsupportedCompression(method));
            }
        };

        let mut offset = self.parser.get_data_offset(entry).await?;
        let mut remaining = entry.compressed_size;
        let mut buf = vec![0u8; BUFFER_SIZE];
        let mut sink = Sink {
            out,
            crc: Crc::new(),
            written: 0,
        };

        while remaining > 0 {
            let n = remaining.min(buf.len() as u64) as usize;
            self.parser
                .reader()
                .read_exact_at(offset, &mut buf[..n])
                .await?;
            offset += n as u64;
            remaining -= n as u64;

            match inflater.as_mut() {
                Some(decoder) => {
                    decoder.write_all(&buf[..n])?;
                    let decoded = std::mem::take(decoder.get_mut());
                    sink.emit(&decoded).await?;
                }
                None => sink.emit(&buf[..n]).await?,
            }
        }

        if let Some(decoder) = inflater {
            let tail = decoder.finish()?;
            sink.emit(&tail).await?;
        }

        if sink.written != entry.uncompressed_size {
            return Err(Error::InvalidArchive(format!(
                "`{}` inflated to {} bytes, expected {}",
                entry.file_name, sink.written, entry.uncompressed_size
            )));
        }
        let actual = sink.crc.sum();
        if actual != entry.crc32 {
            return Err(Error::CrcMismatch {
                name: entry.file_name.clone(),
                expected: entry.crc32,
                actual,
            });
        }

        Ok(sink.written)
    }

    /// Extract file data to memory
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(entry.uncompressed_size.min(1 << 20) as usize);
        self.extract_into(entry, &mut data).await?;
        Ok(data)
    }

    /// Extract an entry to a file node; the backend creates parent folders.
    pub async fn extract_to_file(&self, entry: &ZipFileEntry, dest: &FileObject) -> Result<u64> {
        let mut writer = dest.writer(false).await?;
        let written = self.extract_into(entry, &mut writer).await?;
        writer.shutdown().await?;
        Ok(written)
    }
}
