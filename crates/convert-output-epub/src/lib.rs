//! EPUB output plugin: serializes a BookDocument as an EPUB 2 container.

mod writer;

use std::path::Path;

use convert_core::book::BookDocument;
use convert_core::error::Result;
use convert_core::options::ConversionOptions;
use convert_core::plugin::OutputPlugin;

pub struct EpubOutputPlugin;

impl OutputPlugin for EpubOutputPlugin {
    fn name(&self) -> &str {
        "EPUB Output"
    }

    fn convert(
        &self,
        book: &BookDocument,
        output_path: &Path,
        _options: &ConversionOptions,
    ) -> Result<()> {
        log::info!("Writing EPUB: {}", output_path.display());
        writer::write_epub(book, output_path)
    }
}
