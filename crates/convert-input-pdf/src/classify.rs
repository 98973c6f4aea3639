//! Page classification.
//!
//! Decides per page whether the layout text can be used as-is, the page is a
//! scan that needs OCR, it only carries pictures, or it is empty.

use crate::pdftohtml::{FontSpec, PdfPage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Real text in real fonts.
    Text,
    /// A page-sized picture, optionally overlaid with invisible OCR text.
    Scanned,
    /// Pictures and no text.
    ImageOnly,
    Blank,
}

/// Font families OCR engines use for their invisible text layer.
const OCR_FONT_FAMILIES: &[&str] = &["GlyphLessFont", "Invisible"];

/// Share of the page area a single picture must cover to count as a scan.
const SCAN_COVERAGE: f64 = 0.8;

fn is_ocr_font(family: &str) -> bool {
    OCR_FONT_FAMILIES
        .iter()
        .any(|ocr| family.eq_ignore_ascii_case(ocr))
}

pub fn classify_page(page: &PdfPage, fonts: &[FontSpec]) -> PageType {
    let has_images = !page.images.is_empty();

    let font_family = |font_id: u32| {
        fonts
            .iter()
            .find(|f| f.id == font_id)
            .map(|f| f.family.as_str())
    };

    let visible: Vec<_> = page
        .text_elements
        .iter()
        .filter(|te| !te.inner_text().trim().is_empty())
        .collect();

    // Unknown fonts count as real text.
    let has_real_text = visible
        .iter()
        .any(|te| !font_family(te.font_id).is_some_and(is_ocr_font));

    if has_real_text {
        return PageType::Text;
    }

    if !has_images {
        // Nothing at all, or an OCR layer with no picture underneath.
        return PageType::Blank;
    }

    if !visible.is_empty() || covers_page(page) {
        return PageType::Scanned;
    }

    PageType::ImageOnly
}

fn covers_page(page: &PdfPage) -> bool {
    let page_area = page.width * page.height;
    if page_area <= 0.0 {
        return false;
    }
    page.images
        .iter()
        .any(|img| img.width * img.height >= page_area * SCAN_COVERAGE)
}
