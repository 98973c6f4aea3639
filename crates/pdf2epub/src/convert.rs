//! The conversion routine: PDF input, metadata and cover transforms, EPUB output.

use std::path::Path;

use convert_core::error::Result;
use convert_core::options::{BookMeta, ConversionOptions};
use convert_core::pipeline::PipelineBuilder;
use convert_input_pdf::PdfInputPlugin;
use convert_output_epub::EpubOutputPlugin;

/// Convert `pdf_path` into an EPUB at `epub_path`, synchronously.
///
/// `book_meta` overrides whatever metadata the PDF declares.
pub fn transform_epub(
    pdf_path: &Path,
    epub_path: &Path,
    book_meta: BookMeta,
    options: &ConversionOptions,
) -> Result<()> {
    let options = ConversionOptions {
        book_meta: Some(book_meta),
        ..options.clone()
    };

    if log::log_enabled!(log::Level::Debug) {
        match serde_json::to_string(&options) {
            Ok(json) => log::debug!("Effective options: {}", json),
            Err(e) => log::debug!("Cannot serialize options: {}", e),
        }
    }

    let mut builder = PipelineBuilder::new()
        .input(Box::new(PdfInputPlugin))
        .output(Box::new(EpubOutputPlugin));
    for transform in convert_transforms::standard_transforms() {
        builder = builder.transform(transform);
    }

    log::info!(
        "Converting {} → {}",
        pdf_path.display(),
        epub_path.display()
    );
    builder.build()?.run(pdf_path, epub_path, &options)
}
