//! The JSON conversion request.

use std::ffi::OsStr;
use std::path::PathBuf;

use serde::Deserialize;

use convert_core::options::BookMeta;

use crate::error::AdapterError;

pub const DEFAULT_TITLE: &str = "Untitled";

/// Parsed from the single process argument. Unknown keys are ignored and
/// `null` optional fields count as absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConversionRequest {
    pub pdf_path: PathBuf,
    pub epub_path: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl ConversionRequest {
    pub fn parse(raw: &OsStr) -> Result<Self, AdapterError> {
        let text = raw.to_str().ok_or_else(|| {
            AdapterError::MalformedRequest("argument is not valid UTF-8".to_string())
        })?;
        Self::from_json(text)
    }

    pub fn from_json(text: &str) -> Result<Self, AdapterError> {
        serde_json::from_str(text).map_err(|e| AdapterError::MalformedRequest(e.to_string()))
    }

    /// The requested title, `"Untitled"` when none was given. An explicit
    /// empty string is passed through.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    /// A non-empty author is the sole entry; otherwise there are none.
    pub fn authors(&self) -> Vec<String> {
        match self.author.as_deref() {
            Some(author) if !author.is_empty() => vec![author.to_string()],
            _ => Vec::new(),
        }
    }

    pub fn book_meta(&self) -> BookMeta {
        BookMeta::new(self.title(), self.authors())
    }
}
