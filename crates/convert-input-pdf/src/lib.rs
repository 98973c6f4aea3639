//! PDF input plugin: layout-aware text extraction with OCR for scanned
//! pages, footnote separation, outline-based TOC and a rendered cover.

mod classify;
mod extract;
mod ocr;
pub mod pdftohtml;
mod render;
mod text_builder;
mod toc;

use std::path::Path;

use convert_core::book::BookDocument;
use convert_core::error::Result;
use convert_core::options::ConversionOptions;
use convert_core::plugin::InputPlugin;

pub struct PdfInputPlugin;

impl InputPlugin for PdfInputPlugin {
    fn name(&self) -> &str {
        "PDF Input"
    }

    fn convert(&self, input_path: &Path, options: &ConversionOptions) -> Result<BookDocument> {
        log::info!("Reading PDF: {}", input_path.display());
        extract::extract_pdf(input_path, options)
    }
}
