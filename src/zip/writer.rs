//! Streaming ZIP writer.
//!
//! Entries are deflated on the fly and written with a data descriptor
//! (general purpose flag bit 3), so the output never needs to seek: the
//! CRC-32 and sizes follow each entry's data and are repeated in the
//! central directory written by [`ZipWriter::finish`].
//!
//! ZIP64 is not produced. An archive that would need it fails with
//! [`Error::ArchiveTooLarge`].

use chrono::Local;
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use std::collections::HashSet;
use std::io::Write;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

use super::structures::{
    CompressionMethod, EndOfCentralDirectory, EntryRecord, FLAG_DATA_DESCRIPTOR, FLAG_UTF8,
    dos_datetime,
};

struct OpenEntry {
    record: EntryRecord,
    encoder: DeflateEncoder<Vec<u8>>,
    crc: Crc,
    compressed: u64,
    uncompressed: u64,
}

/// Write-once, append-only ZIP archive over an async sink.
pub struct ZipWriter<W: AsyncWrite + Unpin> {
    out: W,
    offset: u64,
    records: Vec<EntryRecord>,
    names: HashSet<String>,
    current: Option<OpenEntry>,
    mod_time: u16,
    mod_date: u16,
}

fn fits_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ArchiveTooLarge(format!("{what} is {value}")))
}

impl<W: AsyncWrite + Unpin> ZipWriter<W> {
    /// Every entry is stamped with the time the writer was created.
    pub fn new(out: W) -> Self {
        let (mod_time, mod_date) = dos_datetime(Local::now().naive_local());
        Self {
            out,
            offset: 0,
            records: Vec::new(),
            names: HashSet::new(),
            current: None,
            mod_time,
            mod_date,
        }
    }

    /// Names of the entries written so far, in order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    async fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes).await?;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    /// Open a new file entry, closing the previous one first.
    ///
    /// `name` must be a non-empty relative `/`-separated path not used by
    /// an earlier entry.
    pub async fn start_file(&mut self, name: &str) -> Result<()> {
        self.finish_entry().await?;

        if name.is_empty() || name.starts_with('/') || name.ends_with('/') {
            return Err(Error::Message(format!("invalid entry name `{name}`")));
        }
        if name.len() > u16::MAX as usize {
            return Err(Error::Message(format!(
                "entry name of {} bytes is too long",
                name.len()
            )));
        }
        if self.names.contains(name) {
            return Err(Error::DuplicateEntry(name.to_string()));
        }

        let record = EntryRecord {
            name: name.to_string(),
            flags: FLAG_DATA_DESCRIPTOR | FLAG_UTF8,
            method: CompressionMethod::Deflate,
            mod_time: self.mod_time,
            mod_date: self.mod_date,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            lfh_offset: fits_u32(self.offset, "local header offset")?,
        };
        let header = record.local_header()?;
        self.put(&header).await?;
        self.names.insert(record.name.clone());

        self.current = Some(OpenEntry {
            record,
            encoder: DeflateEncoder::new(Vec::new(), Compression::default()),
            crc: Crc::new(),
            compressed: 0,
            uncompressed: 0,
        });
        Ok(())
    }

    /// Append data to the open entry.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        let entry = self
            .current
            .as_mut()
            .ok_or_else(|| Error::Message("no zip entry is open".to_string()))?;
        entry.crc.update(data);
        entry.uncompressed += data.len() as u64;
        entry.encoder.write_all(data)?;
        let pending = std::mem::take(entry.encoder.get_mut());
        entry.compressed += pending.len() as u64;
        self.put(&pending).await
    }

    /// Close the open entry, if any, writing its data descriptor.
    pub async fn finish_entry(&mut self) -> Result<()> {
        let Some(entry) = self.current.take() else {
            return Ok(());
        };
        let OpenEntry {
            mut record,
            encoder,
            crc,
            compressed,
            uncompressed,
        } = entry;

        let tail = encoder.finish()?;
        self.put(&tail).await?;

        record.crc32 = crc.sum();
        record.compressed_size = fits_u32(compressed + tail.len() as u64, "compressed size")?;
        record.uncompressed_size = fits_u32(uncompressed, "uncompressed size")?;

        let descriptor = record.data_descriptor()?;
        self.put(&descriptor).await?;
        self.records.push(record);
        Ok(())
    }

    /// Write the central directory and end record, then shut the sink down.
    pub async fn finish(mut self) -> Result<W> {
        self.finish_entry().await?;

        let total_entries = u16::try_from(self.records.len())
            .ok()
            .filter(|n| *n != u16::MAX)
            .ok_or_else(|| {
                Error::ArchiveTooLarge(format!("{} entries", self.records.len()))
            })?;

        let cd_start = self.offset;
        let records = std::mem::take(&mut self.records);
        for record in &records {
            let header = record.central_header()?;
            self.put(&header).await?;
        }

        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: total_entries,
            total_entries,
            cd_size: fits_u32(self.offset - cd_start, "central directory size")?,
            cd_offset: fits_u32(cd_start, "central directory offset")?,
            comment_len: 0,
        };
        let end = eocd.to_bytes()?;
        self.put(&end).await?;

        self.out.flush().await?;
        self.out.shutdown().await?;
        Ok(self.out)
    }
}
