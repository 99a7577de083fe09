//! # fileconnect
//!
//! File operations over a virtual file system: create, append, copy, move,
//! delete, exist and search, plus zip archiving, unzip and archive listing.
//!
//! Locations are URIs resolved by a [`FileSystemManager`]: local paths and
//! `file://`, an in-process `ram://` tree, and read-only `http(s)://`
//! resources that are read with Range requests.
//!
//! ## Features
//!
//! - Recursive archiver that keeps going when single files cannot be read
//! - Streaming zip writer (DEFLATE, data descriptors) and a reader for
//!   STORED and DEFLATE entries, including ZIP64 archives
//! - Unzip that refuses entry names escaping the destination
//! - Wildcard patterns (`*`, `?`) for file and folder names
//!
//! ## Example
//!
//! ```no_run
//! use fileconnect::connector::{FILE_LOCATION, NEW_FILE_LOCATION, Operation, Parameters};
//! use fileconnect::{FileSystemManager, FsOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = FileSystemManager::new(FsOptions::default())?;
//!     let params = Parameters::new()
//!         .with(FILE_LOCATION, Some("/var/data/in"))
//!         .with(NEW_FILE_LOCATION, Some("/var/data/in.zip"));
//!
//!     let result = Operation::Archive.execute(&manager, &params).await;
//!     println!("{}", result.to_json(true)?);
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod connector;
pub mod encoding;
pub mod error;
pub mod io;
pub mod ops;
pub mod pattern;
pub mod vfs;
pub mod zip;

pub use archive::{ArchiveReport, SkippedEntry, archive};
pub use cli::Cli;
pub use connector::{Operation, OperationResult, Parameters};
pub use error::{Error, Result};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use pattern::{CaseSensitivity, FilePattern, wildcard_match};
pub use vfs::{FileKind, FileObject, FileSystem, FileSystemManager, FsOptions};
pub use zip::{ZipExtractor, ZipFileEntry, ZipWriter};
