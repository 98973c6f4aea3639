//! Conversion options shared across the pipeline.

use serde::{Deserialize, Serialize};

/// All options controlling a PDF → EPUB conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    // -- OCR --
    pub ocr_size: OcrSize,
    /// Tesseract language pack(s), e.g. `eng` or `eng+deu`.
    pub ocr_language: String,
    pub ignore_ocr_errors: bool,

    // -- PDF --
    pub ignore_pdf_errors: bool,
    /// JPEG quality (1-100) for rendered page images.
    pub jpeg_quality: u8,

    // -- Structure --
    pub includes_cover: bool,
    pub includes_footnotes: bool,

    // -- Metadata --
    /// Caller-supplied metadata; overrides what the PDF declares.
    pub book_meta: Option<BookMeta>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            ocr_size: OcrSize::default(),
            ocr_language: "eng".to_string(),
            ignore_ocr_errors: false,
            ignore_pdf_errors: false,
            jpeg_quality: 80,
            includes_cover: true,
            includes_footnotes: true,
            book_meta: None,
        }
    }
}

/// Book metadata handed to the conversion routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMeta {
    pub title: String,
    /// Ordered author names.
    pub authors: Vec<String>,
}

impl BookMeta {
    pub fn new(title: impl Into<String>, authors: Vec<String>) -> Self {
        Self {
            title: title.into(),
            authors,
        }
    }
}

/// OCR quality tier. Larger tiers render scanned pages at a higher DPI,
/// trading speed for recognition accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrSize {
    Tiny,
    #[default]
    Small,
    Base,
    Large,
    Gundam,
}

impl OcrSize {
    /// Resolution used when rasterizing a page for recognition.
    pub fn render_dpi(self) -> u16 {
        match self {
            OcrSize::Tiny => 100,
            OcrSize::Small => 150,
            OcrSize::Base => 200,
            OcrSize::Large => 300,
            OcrSize::Gundam => 400,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OcrSize::Tiny => "tiny",
            OcrSize::Small => "small",
            OcrSize::Base => "base",
            OcrSize::Large => "large",
            OcrSize::Gundam => "gundam",
        }
    }
}

impl std::fmt::Display for OcrSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ConversionOptions::default();
        assert_eq!(opts.ocr_size, OcrSize::Small);
        assert_eq!(opts.ocr_language, "eng");
        assert_eq!(opts.jpeg_quality, 80);
        assert!(opts.includes_cover);
        assert!(opts.includes_footnotes);
        assert!(!opts.ignore_pdf_errors);
        assert!(!opts.ignore_ocr_errors);
        assert!(opts.book_meta.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let opts: ConversionOptions =
            serde_json::from_str(r#"{"ocr_size": "large", "ignore_ocr_errors": true}"#).unwrap();
        assert_eq!(opts.ocr_size, OcrSize::Large);
        assert!(opts.ignore_ocr_errors);
        // Defaults filled in
        assert_eq!(opts.jpeg_quality, 80);
        assert!(opts.includes_cover);
    }

    #[test]
    fn test_ocr_size_serde() {
        let size: OcrSize = serde_json::from_str("\"gundam\"").unwrap();
        assert_eq!(size, OcrSize::Gundam);
        assert_eq!(serde_json::to_string(&OcrSize::Tiny).unwrap(), "\"tiny\"");
        assert!(serde_json::from_str::<OcrSize>("\"huge\"").is_err());
    }

    #[test]
    fn test_ocr_size_dpi_increases_with_tier() {
        let tiers = [
            OcrSize::Tiny,
            OcrSize::Small,
            OcrSize::Base,
            OcrSize::Large,
            OcrSize::Gundam,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0].render_dpi() < pair[1].render_dpi());
        }
        assert_eq!(OcrSize::Small.render_dpi(), 150);
    }

    #[test]
    fn test_book_meta_round_trip() {
        let mut opts = ConversionOptions::default();
        opts.book_meta = Some(BookMeta::new("Dune", vec!["Frank Herbert".to_string()]));
        let json = serde_json::to_string(&opts).unwrap();
        let parsed: ConversionOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, opts);
    }
}
