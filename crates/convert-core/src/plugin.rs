//! Plugin traits for input, output, and transform plugins.

use std::path::Path;

use crate::book::BookDocument;
use crate::error::Result;
use crate::options::ConversionOptions;

/// Input format plugin: reads a source file into a BookDocument.
pub trait InputPlugin {
    /// Human-readable name of this plugin.
    fn name(&self) -> &str;

    fn convert(&self, input_path: &Path, options: &ConversionOptions) -> Result<BookDocument>;
}

/// Output format plugin: serializes a BookDocument to a target file.
pub trait OutputPlugin {
    /// Human-readable name of this plugin.
    fn name(&self) -> &str;

    fn convert(
        &self,
        book: &BookDocument,
        output_path: &Path,
        options: &ConversionOptions,
    ) -> Result<()>;
}

/// A transform that mutates the BookDocument IR between input and output.
pub trait Transform {
    /// Human-readable name of this transform.
    fn name(&self) -> &str;

    fn apply(&self, book: &mut BookDocument, options: &ConversionOptions) -> Result<()>;

    /// Whether this transform should run given the current options.
    /// Default: always run.
    fn should_run(&self, _options: &ConversionOptions) -> bool {
        true
    }
}
