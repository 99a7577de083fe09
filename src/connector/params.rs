use std::collections::HashMap;

use crate::error::{Error, Result};

/// File or folder the operation acts on
pub const FILE_LOCATION: &str = "source";
/// Target of copy, move, archive and unzip
pub const NEW_FILE_LOCATION: &str = "destination";
/// Text written by create and append
pub const CONTENT: &str = "inputContent";
/// Encoding label for [`CONTENT`]
pub const ENCODING: &str = "encoding";
/// Wildcard over file base names
pub const FILE_PATTERN: &str = "filePattern";
/// Wildcard over folder base names
pub const DIR_PATTERN: &str = "dirPattern";

/// Named string parameters of one invocation.
///
/// Empty values are treated as absent; whitespace is kept as given.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    values: HashMap<String, String>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Builder-style [`set`](Self::set) that skips `None`.
    pub fn with(mut self, name: &str, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, name: &'static str) -> Result<&str> {
        self.get(name).ok_or(Error::MissingParameter(name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
