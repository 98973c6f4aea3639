//! Conversion policy applied to every request. Callers cannot change it.

use convert_core::options::{ConversionOptions, OcrSize};

/// Favors speed over recognition quality.
pub const OCR_SIZE: OcrSize = OcrSize::Small;
pub const INCLUDES_COVER: bool = true;
pub const INCLUDES_FOOTNOTES: bool = true;
pub const IGNORE_PDF_ERRORS: bool = true;
pub const IGNORE_OCR_ERRORS: bool = true;

pub fn conversion_options() -> ConversionOptions {
    ConversionOptions {
        ocr_size: OCR_SIZE,
        includes_cover: INCLUDES_COVER,
        includes_footnotes: INCLUDES_FOOTNOTES,
        ignore_pdf_errors: IGNORE_PDF_ERRORS,
        ignore_ocr_errors: IGNORE_OCR_ERRORS,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_options() {
        let opts = conversion_options();
        assert_eq!(opts.ocr_size, OcrSize::Small);
        assert!(opts.includes_cover);
        assert!(opts.includes_footnotes);
        assert!(opts.ignore_pdf_errors);
        assert!(opts.ignore_ocr_errors);
        assert_eq!(opts.book_meta, None);
    }
}
