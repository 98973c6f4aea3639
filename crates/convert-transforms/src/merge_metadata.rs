//! MergeMetadata transform: caller metadata over PDF metadata, then defaults.

use convert_core::book::BookDocument;
use convert_core::error::Result;
use convert_core::options::ConversionOptions;
use convert_core::plugin::Transform;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Applies `options.book_meta` and fills in the fields every EPUB needs.
///
/// A supplied title wins over the PDF's unless it is blank. The supplied
/// author list always replaces the PDF's, including when it is empty.
pub struct MergeMetadata;

impl Transform for MergeMetadata {
    fn name(&self) -> &str {
        "MergeMetadata"
    }

    fn apply(&self, book: &mut BookDocument, options: &ConversionOptions) -> Result<()> {
        if let Some(meta) = &options.book_meta {
            book.metadata.set_title(meta.title.as_str());
            book.metadata.set_authors(&meta.authors);
        }

        if book.metadata.title().is_none() {
            book.metadata.set_title(DEFAULT_TITLE);
        }

        if book.metadata.language().is_none() {
            book.metadata.set_language(DEFAULT_LANGUAGE);
        }

        if book.uid.is_none() {
            book.uid = Some(format!("urn:uuid:{}", uuid::Uuid::new_v4()));
        }

        log::info!(
            "Metadata merged: title={:?}, authors={:?}",
            book.metadata.title(),
            book.metadata.authors()
        );
        Ok(())
    }
}
