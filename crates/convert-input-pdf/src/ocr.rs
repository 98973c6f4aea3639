//! OCR for scanned pages: render with pdftoppm, recognize with tesseract.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use convert_core::error::{ConvertError, Result};
use convert_core::options::ConversionOptions;

use crate::render;

/// What OCR produced for one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOcr {
    /// Recognized, non-empty text.
    Text(String),
    /// No usable text; the rendered page image stands in for it.
    Image(Vec<u8>),
    /// Nothing usable (only when OCR errors are tolerated).
    Failed,
}

/// Recognize the given pages. Failures abort with `ConvertError::Ocr` unless
/// `options.ignore_ocr_errors` is set, in which case the affected pages
/// degrade to their image or to `PageOcr::Failed`.
pub fn recognize_pages(
    pdf_path: &Path,
    pages: &[u32],
    total_pages: u32,
    options: &ConversionOptions,
) -> Result<HashMap<u32, PageOcr>> {
    let mut results = HashMap::new();
    if pages.is_empty() {
        return Ok(results);
    }

    let tolerate = options.ignore_ocr_errors;
    let dpi = options.ocr_size.render_dpi();

    let mut images = match render::render_pages(
        pdf_path,
        pages,
        total_pages,
        dpi,
        options.jpeg_quality,
    ) {
        Ok(images) => images,
        Err(e) if tolerate => {
            log::warn!("Cannot render scanned pages, skipping OCR: {}", e);
            HashMap::new()
        }
        Err(e) => {
            let cause = match e {
                ConvertError::Pdf(msg) => msg,
                other => other.to_string(),
            };
            return Err(ConvertError::Ocr(format!("Page rendering failed: {}", cause)));
        }
    };

    let engine_ready = match render::check_tool("tesseract") {
        Ok(()) => true,
        Err(e) if tolerate => {
            log::warn!("OCR engine unavailable, keeping page images: {}", e);
            false
        }
        Err(msg) => return Err(ConvertError::Ocr(msg)),
    };

    log::info!(
        "OCR ({} tier, {} DPI, language {}) on {} page(s)",
        options.ocr_size,
        dpi,
        options.ocr_language,
        pages.len()
    );

    let tmp_dir = tempfile::TempDir::new()
        .map_err(|e| ConvertError::Ocr(format!("Failed to create temp dir: {}", e)))?;

    for &page in pages {
        let Some(image) = images.remove(&page) else {
            if !tolerate {
                return Err(ConvertError::Ocr(format!("Page {} was not rendered", page)));
            }
            results.insert(page, PageOcr::Failed);
            continue;
        };

        if !engine_ready {
            results.insert(page, PageOcr::Image(image));
            continue;
        }

        let image_path = tmp_dir.path().join(format!("scan-{}.jpg", page));
        std::fs::write(&image_path, &image)?;

        let outcome = match run_tesseract(&image_path, &options.ocr_language, dpi) {
            Ok(text) if text.trim().is_empty() => {
                log::debug!("OCR found no text on page {}", page);
                PageOcr::Image(image)
            }
            Ok(text) => PageOcr::Text(text),
            Err(e) if tolerate => {
                log::warn!("OCR failed on page {}: {}", page, e);
                PageOcr::Image(image)
            }
            Err(e) => return Err(e),
        };
        results.insert(page, outcome);
    }

    Ok(results)
}

fn run_tesseract(image_path: &Path, language: &str, dpi: u16) -> Result<String> {
    let output = Command::new("tesseract")
        .arg(image_path.as_os_str())
        .arg("stdout")
        .arg("-l")
        .arg(language)
        .arg("--dpi")
        .arg(dpi.to_string())
        .output()
        .map_err(|e| ConvertError::Ocr(format!("Failed to run tesseract: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConvertError::Ocr(format!(
            "tesseract failed: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
