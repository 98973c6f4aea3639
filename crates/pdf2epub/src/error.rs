//! Adapter failure taxonomy.

use convert_core::error::ConvertError;
use thiserror::Error;

/// Where a verdict is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Error)]
pub enum AdapterError {
    /// The process was started without a request argument.
    #[error("No arguments provided")]
    MissingArgument,

    /// The argument is not UTF-8, not JSON, or lacks required keys.
    #[error("invalid request: {0}")]
    MalformedRequest(String),

    #[error(transparent)]
    Conversion(#[from] ConvertError),
}

impl AdapterError {
    /// Existing callers read the "no arguments" verdict from stdout and
    /// every other failure from stderr.
    pub fn stream(&self) -> Stream {
        match self {
            AdapterError::MissingArgument => Stream::Stdout,
            AdapterError::MalformedRequest(_) | AdapterError::Conversion(_) => Stream::Stderr,
        }
    }

    pub fn exit_code(&self) -> i32 {
        1
    }
}
