use thiserror::Error;

/// Errors produced by the virtual file system, the zip codec and the
/// file operations built on top of them.
#[derive(Error, Debug)]
pub enum Error {
    /// Wrapper for underlying IO errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("`{0}` does not exist")]
    NotFound(String),

    #[error("`{0}` is not a folder")]
    NotAFolder(String),

    #[error("invalid URI `{0}`")]
    InvalidUri(String),

    #[error("unsupported URI scheme `{0}`")]
    UnsupportedScheme(String),

    /// Write attempted against a backend that only supports reads.
    #[error("`{0}` is on a read-only file system")]
    ReadOnly(String),

    #[error("invalid zip archive: {0}")]
    InvalidArchive(String),

    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u16),

    #[error("CRC-32 mismatch for `{name}`: expected {expected:08x}, got {actual:08x}")]
    CrcMismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    /// Zip entry name that would resolve outside the extraction root.
    #[error("unsafe entry name `{0}`")]
    UnsafeEntryName(String),

    #[error("duplicate entry name `{0}`")]
    DuplicateEntry(String),

    #[error("archive exceeds the non-ZIP64 limits: {0}")]
    ArchiveTooLarge(String),

    #[error("unsupported encoding `{0}`")]
    UnsupportedEncoding(String),

    #[error("missing parameter `{0}`")]
    MissingParameter(&'static str),

    /// Generic error with context message.
    #[error("{0}")]
    Message(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Message(s)
    }
}

impl Error {
    /// True when the error means the requested node is absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
