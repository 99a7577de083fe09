//! Parsing of file locations into a backend scheme and a native path.

use super::SEPARATORS;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme {
    File,
    Ram,
    Http,
    /// Any scheme without a backend (`ftp`, `sftp`, …)
    Other(String),
}

/// A location split into its scheme and backend-native path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub scheme: Scheme,
    pub path: String,
}

/// A single letter before `:` is a Windows drive, not a scheme.
fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    candidate.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Drop trailing separators, keeping a bare root intact.
fn trim_trailing(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATORS);
    if trimmed.is_empty() { &path[..path.len().min(1)] } else { trimmed }
}

/// Split `uri` into a [`Location`].
///
/// Strings without a `scheme://` prefix are local paths.
pub fn parse(uri: &str) -> Result<Location> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(Error::InvalidUri(uri.to_string()));
    }

    let Some((scheme, rest)) = uri.split_once("://").filter(|(s, _)| is_scheme(s)) else {
        return Ok(Location {
            scheme: Scheme::File,
            path: trim_trailing(uri).to_string(),
        });
    };

    match scheme.to_ascii_lowercase().as_str() {
        "file" => {
            // file:///C:/x carries a leading slash before the drive
            let bytes = rest.as_bytes();
            let rest = if bytes.len() > 2 && bytes[0] == b'/' && bytes[2] == b':' {
                &rest[1..]
            } else {
                rest
            };
            if rest.is_empty() {
                return Err(Error::InvalidUri(uri.to_string()));
            }
            Ok(Location {
                scheme: Scheme::File,
                path: trim_trailing(rest).to_string(),
            })
        }
        "ram" => Ok(Location {
            scheme: Scheme::Ram,
            path: super::ram::normalize(rest),
        }),
        "http" | "https" => {
            if rest.is_empty() {
                return Err(Error::InvalidUri(uri.to_string()));
            }
            Ok(Location {
                scheme: Scheme::Http,
                path: uri.to_string(),
            })
        }
        other => Ok(Location {
            scheme: Scheme::Other(other.to_string()),
            path: rest.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_are_local() {
        let loc = parse("/tmp/src/").unwrap();
        assert_eq!(loc.scheme, Scheme::File);
        assert_eq!(loc.path, "/tmp/src");

        assert_eq!(parse("/").unwrap().path, "/");
        assert_eq!(parse("C:\\data\\in").unwrap().scheme, Scheme::File);
        assert_eq!(parse("relative/dir").unwrap().path, "relative/dir");
    }

    #[test]
    fn file_scheme() {
        assert_eq!(parse("file:///tmp/out.zip").unwrap().path, "/tmp/out.zip");
        assert_eq!(parse("FILE:///C:/data").unwrap().path, "C:/data");
        assert!(parse("file://").is_err());
    }

    #[test]
    fn ram_and_http() {
        let ram = parse("ram://a//b/").unwrap();
        assert_eq!(ram.scheme, Scheme::Ram);
        assert_eq!(ram.path, "/a/b");

        let http = parse("https://example.com/x.zip").unwrap();
        assert_eq!(http.scheme, Scheme::Http);
        assert_eq!(http.path, "https://example.com/x.zip");
    }

    #[test]
    fn other_schemes_are_kept() {
        let loc = parse("sftp://user@host/home/x").unwrap();
        assert_eq!(loc.scheme, Scheme::Other("sftp".to_string()));
        assert!(parse("   ").is_err());
    }
}
