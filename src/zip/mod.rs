//! ZIP archive reading and writing.
//!
//! - `structures`: record layouts (EOCD, central and local headers)
//! - [`ZipParser`]: central-directory reader over any [`ReadAt`](crate::io::ReadAt)
//! - [`ZipExtractor`]: entry extraction with CRC-32 verification
//! - [`ZipWriter`]: streaming writer used by the archiver
//!
//! ## Supported Features
//!
//! - Reading standard and ZIP64 archives
//! - STORED and DEFLATE on read, DEFLATE on write
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - Written archives are limited to 4 GiB and 65534 entries

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::ZipWriter;
