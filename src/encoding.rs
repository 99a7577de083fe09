//! Text content encoding for the create and append operations.

use encoding_rs::Encoding;
use std::borrow::Cow;

use crate::error::{Error, Result};

pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Encode `content` with the encoding named by `label`, UTF-8 by default.
///
/// Labels follow the WHATWG Encoding Standard, so `UTF8`, `utf-8` and
/// `latin1` are all accepted (the last one maps to windows-1252). Encodings
/// that cannot be produced (UTF-16, `replacement`) are rejected, as is
/// content with characters the target encoding cannot represent.
pub fn encode<'a>(content: &'a str, label: Option<&str>) -> Result<Cow<'a, [u8]>> {
    let label = label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_ENCODING);
    let encoding = Encoding::for_label(label.as_bytes())
        .filter(|e| e.output_encoding() == *e)
        .ok_or_else(|| Error::UnsupportedEncoding(label.to_string()))?;

    let (bytes, _, had_errors) = encoding.encode(content);
    if had_errors {
        return Err(Error::Message(format!(
            "content cannot be represented in {}",
            encoding.name()
        )));
    }
    Ok(bytes)
}
