use clap::Parser;
use std::time::Duration;

use crate::connector::{
    CONTENT, DIR_PATTERN, ENCODING, FILE_LOCATION, FILE_PATTERN, NEW_FILE_LOCATION, Operation,
    Parameters,
};
use crate::vfs::FsOptions;

#[derive(Parser, Debug)]
#[command(name = "fileconnect")]
#[command(version)]
#[command(about = "File operations over local, in-memory and HTTP locations", long_about = None)]
#[command(after_help = "Examples:\n  \
  fileconnect archive --source /data/in --destination /data/in.zip\n  \
  fileconnect search --source /data --file-pattern '*.csv'\n  \
  fileconnect listZip --source https://example.com/archive.zip")]
pub struct Cli {
    /// Operation to run
    #[arg(value_enum, value_name = "OPERATION")]
    pub operation: Operation,

    /// File or folder to operate on (path or URI)
    #[arg(long, short = 's', value_name = "URI")]
    pub source: Option<String>,

    /// Target location for copy, move, archive and unzip
    #[arg(long, short = 'd', value_name = "URI")]
    pub destination: Option<String>,

    /// Text written by create and append
    #[arg(long, short = 'c', value_name = "TEXT")]
    pub content: Option<String>,

    /// Encoding of --content (default: UTF-8)
    #[arg(long, short = 'e', value_name = "LABEL")]
    pub encoding: Option<String>,

    /// Wildcard for file names (copy, search)
    #[arg(long, value_name = "PATTERN")]
    pub file_pattern: Option<String>,

    /// Wildcard for folder names (search)
    #[arg(long, value_name = "PATTERN")]
    pub dir_pattern: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// HTTP reconnect attempts for range reads
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub max_retry: u32,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parameters(&self) -> Parameters {
        Parameters::new()
            .with(FILE_LOCATION, self.source.as_deref())
            .with(NEW_FILE_LOCATION, self.destination.as_deref())
            .with(CONTENT, self.content.as_deref())
            .with(ENCODING, self.encoding.as_deref())
            .with(FILE_PATTERN, self.file_pattern.as_deref())
            .with(DIR_PATTERN, self.dir_pattern.as_deref())
    }

    pub fn fs_options(&self) -> FsOptions {
        FsOptions {
            http_timeout: Duration::from_secs(self.timeout),
            http_max_retry: self.max_retry,
        }
    }

    /// Default log directive when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
