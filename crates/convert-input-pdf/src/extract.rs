//! PDF extraction orchestrator.
//!
//! Uses `pdftohtml -xml` for layout-aware extraction, OCR for scanned pages,
//! and falls back to lopdf's plain-text extraction when poppler is missing.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use convert_core::book::{BookDocument, ManifestData, ManifestItem, Metadata};
use convert_core::error::{ConvertError, Result};
use convert_core::options::ConversionOptions;
use convert_utils::xml::{escape_xml_attr, text_to_paragraphs, xhtml11_document};

use crate::classify::{self, PageType};
use crate::ocr::{self, PageOcr};
use crate::pdftohtml::{self, LayoutDocument};
use crate::render;
use crate::text_builder;
use crate::toc;

/// Manifest id of the rendered first page.
const COVER_IMAGE_ID: &str = "cover-image";
const COVER_DPI: u16 = 150;

/// Extract a PDF file into a BookDocument.
pub fn extract_pdf(path: &Path, options: &ConversionOptions) -> Result<BookDocument> {
    std::fs::File::open(path)
        .map_err(|e| ConvertError::Pdf(format!("Cannot open {}: {}", path.display(), e)))?;

    let doc = load_document(path, options)?;

    let mut book = BookDocument::new();
    if let Some(doc) = &doc {
        extract_metadata(doc, &mut book.metadata);
    }

    let mut pages = PageSink::default();
    match pdftohtml::run_pdftohtml_xml(path) {
        Ok(layout) => {
            if layout.pages.is_empty() {
                return Err(no_pages());
            }
            extract_layout(path, &layout, options, &mut book, &mut pages)?;
            book.toc = toc::build_toc(&layout.outline, &pages.hrefs);
        }
        Err(e) => match &doc {
            Some(doc) => {
                log::warn!("Layout extraction unavailable ({}); using plain text.", e);
                extract_plain_text(doc, options, &mut book, &mut pages)?;
                book.toc = toc::build_toc(&[], &pages.hrefs);
            }
            None => return Err(e),
        },
    }

    let page_count = pages.hrefs.len() as u32;
    log::info!("Extracted {} pages", page_count);

    if options.includes_cover {
        add_cover_image(path, page_count, options, &mut book);
    }

    book.manifest.add(ManifestItem::new(
        "stylesheet",
        "style.css",
        "text/css",
        ManifestData::Css(DEFAULT_CSS.to_string()),
    ));

    Ok(book)
}

fn no_pages() -> ConvertError {
    ConvertError::Pdf("PDF contains no pages".to_string())
}

/// Parse the object graph. A broken file is only fatal when PDF errors are
/// not tolerated; layout extraction may still read it.
fn load_document(path: &Path, options: &ConversionOptions) -> Result<Option<Document>> {
    match Document::load(path) {
        Ok(doc) => Ok(Some(doc)),
        Err(e) if options.ignore_pdf_errors => {
            log::warn!("Ignoring PDF structure error: {}", e);
            Ok(None)
        }
        Err(e) => Err(ConvertError::Pdf(format!("Failed to load PDF: {}", e))),
    }
}

/// Collects page documents into the manifest and spine in reading order.
#[derive(Default)]
struct PageSink {
    hrefs: BTreeMap<u32, String>,
}

impl PageSink {
    fn add(&mut self, book: &mut BookDocument, page_num: u32, xhtml: String) {
        let id = format!("page{}", page_num);
        let href = format!("page{}.xhtml", page_num);
        book.manifest.add(ManifestItem::new(
            &id,
            &href,
            "application/xhtml+xml",
            ManifestData::Xhtml(xhtml),
        ));
        book.spine.push(id, true);
        self.hrefs.insert(page_num, href);
    }
}

fn extract_layout(
    pdf_path: &Path,
    layout: &LayoutDocument,
    options: &ConversionOptions,
    book: &mut BookDocument,
    sink: &mut PageSink,
) -> Result<()> {
    let total_pages = layout.pages.len() as u32;

    let classifications: Vec<PageType> = layout
        .pages
        .iter()
        .map(|page| {
            let page_type = classify::classify_page(page, &layout.fonts);
            log::debug!("Page {}: {:?}", page.number, page_type);
            page_type
        })
        .collect();

    let scanned: Vec<u32> = layout
        .pages
        .iter()
        .zip(&classifications)
        .filter(|(_, t)| **t == PageType::Scanned)
        .map(|(p, _)| p.number)
        .collect();

    log::info!(
        "Classification: {} scanned of {} pages",
        scanned.len(),
        total_pages
    );

    let mut ocr_results = ocr::recognize_pages(pdf_path, &scanned, total_pages, options)?;

    // Pictures from pdftohtml; a scan's own picture is replaced by its OCR result.
    let mut image_map: HashMap<String, String> = HashMap::new();
    let mut img_counter = 0u32;
    for (page, page_type) in layout.pages.iter().zip(&classifications) {
        if *page_type == PageType::Scanned {
            continue;
        }
        for img in &page.images {
            if image_map.contains_key(&img.src) {
                continue;
            }
            let data = match std::fs::read(layout.image_dir.join(&img.src)) {
                Ok(data) if !data.is_empty() => data,
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("Skipping image {}: {}", img.src, e);
                    continue;
                }
            };
            img_counter += 1;
            let (ext, mime) = if img.src.ends_with(".png") {
                ("png", "image/png")
            } else {
                ("jpg", "image/jpeg")
            };
            let href = format!("images/page{}_{}.{}", page.number, img_counter, ext);
            book.manifest.add(ManifestItem::new(
                format!("img_{}_{}", page.number, img_counter),
                &href,
                mime,
                ManifestData::Binary(data),
            ));
            image_map.insert(img.src.clone(), href);
        }
    }

    for (page, page_type) in layout.pages.iter().zip(&classifications) {
        let xhtml = match page_type {
            PageType::Text => text_builder::build_text_page_xhtml(
                page,
                &layout.fonts,
                &image_map,
                options.includes_footnotes,
            ),
            PageType::Scanned => match ocr_results.remove(&page.number) {
                Some(PageOcr::Text(text)) => build_page_xhtml(page.number, &text, &[]),
                Some(PageOcr::Image(data)) => {
                    let href = format!("images/scan_page{}.jpg", page.number);
                    book.manifest.add(ManifestItem::new(
                        format!("img_scan{}", page.number),
                        &href,
                        "image/jpeg",
                        ManifestData::Binary(data),
                    ));
                    build_scanned_page_xhtml(page.number, &href)
                }
                Some(PageOcr::Failed) | None => build_placeholder_xhtml(page.number),
            },
            PageType::ImageOnly => {
                let hrefs: Vec<String> = page
                    .images
                    .iter()
                    .filter_map(|img| image_map.get(&img.src).cloned())
                    .collect();
                build_page_xhtml(page.number, "", &hrefs)
            }
            PageType::Blank => build_placeholder_xhtml(page.number),
        };
        sink.add(book, page.number, xhtml);
    }

    Ok(())
}

fn extract_plain_text(
    doc: &Document,
    options: &ConversionOptions,
    book: &mut BookDocument,
    sink: &mut PageSink,
) -> Result<()> {
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    add_text_pages(&page_numbers, |n| doc.extract_text(&[n]), options, book, sink)
}

/// One page document per page number. An unreadable page becomes a
/// placeholder when PDF errors are tolerated.
fn add_text_pages<F>(
    page_numbers: &[u32],
    mut page_text: F,
    options: &ConversionOptions,
    book: &mut BookDocument,
    sink: &mut PageSink,
) -> Result<()>
where
    F: FnMut(u32) -> lopdf::Result<String>,
{
    if page_numbers.is_empty() {
        return Err(no_pages());
    }

    for &page_num in page_numbers {
        let text = match page_text(page_num) {
            Ok(text) => text,
            Err(e) if options.ignore_pdf_errors => {
                log::warn!("Ignoring unreadable page {}: {}", page_num, e);
                String::new()
            }
            Err(e) => {
                return Err(ConvertError::Pdf(format!(
                    "Failed to extract text from page {}: {}",
                    page_num, e
                )))
            }
        };
        sink.add(book, page_num, build_page_xhtml(page_num, &text, &[]));
    }
    Ok(())
}

/// Render the first page as the cover picture. Failure only loses the picture.
fn add_cover_image(
    pdf_path: &Path,
    total_pages: u32,
    options: &ConversionOptions,
    book: &mut BookDocument,
) {
    match render::render_pages(pdf_path, &[1], total_pages, COVER_DPI, options.jpeg_quality) {
        Ok(mut rendered) => match rendered.remove(&1) {
            Some(data) if !data.is_empty() => {
                book.manifest.add(ManifestItem::new(
                    COVER_IMAGE_ID,
                    "images/cover.jpg",
                    "image/jpeg",
                    ManifestData::Binary(data),
                ));
                book.metadata.set_cover_image(COVER_IMAGE_ID);
            }
            _ => log::warn!("First page produced no cover image"),
        },
        Err(e) => log::warn!("Cover image unavailable: {}", e),
    }
}

fn page_document(page_num: u32, body: &str) -> String {
    xhtml11_document(&format!("Page {}", page_num), "en", Some("style.css"), body)
}

fn build_scanned_page_xhtml(page_num: u32, img_href: &str) -> String {
    let body = format!(
        "  <div class=\"page\">\n    <div class=\"page-image\"><img src=\"{}\" alt=\"Page {}\"/></div>\n  </div>",
        escape_xml_attr(img_href),
        page_num
    );
    page_document(page_num, &body)
}

fn build_placeholder_xhtml(page_num: u32) -> String {
    let body = format!(
        "  <div class=\"page\">\n    <p class=\"empty-page\">[Page {}]</p>\n  </div>",
        page_num
    );
    page_document(page_num, &body)
}

/// A page from plain text and picture references.
fn build_page_xhtml(page_num: u32, text: &str, image_hrefs: &[String]) -> String {
    let paragraphs = text_to_paragraphs(text, "    ");
    if paragraphs.is_empty() && image_hrefs.is_empty() {
        return build_placeholder_xhtml(page_num);
    }

    let mut body = String::from("  <div class=\"page\">\n");
    body.push_str(&paragraphs);
    for href in image_hrefs {
        body.push_str(&format!(
            "    <div class=\"page-image\"><img src=\"{}\" alt=\"Page {} image\"/></div>\n",
            escape_xml_attr(href),
            page_num
        ));
    }
    body.push_str("  </div>");

    page_document(page_num, &body)
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 (with or without
/// BOM), otherwise Latin-1.
fn decode_pdf_string(raw: &[u8]) -> String {
    if let Some(utf16) = raw.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    let raw = raw.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        Err(_) => raw.iter().map(|&b| b as char).collect(),
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let raw = dict.get(key).ok()?.as_str().ok()?;
    let value = decode_pdf_string(raw).trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Title, author and subject from the document information dictionary.
fn extract_metadata(doc: &Document, metadata: &mut Metadata) {
    let Some(info) = info_dictionary(doc) else {
        return;
    };
    if let Some(title) = info_string(info, b"Title") {
        metadata.set_title(title);
    }
    if let Some(author) = info_string(info, b"Author") {
        metadata.add_author(author);
    }
    if let Some(subject) = info_string(info, b"Subject") {
        metadata.set_description(subject);
    }
}

const DEFAULT_CSS: &str = r#"body {
    margin: 0;
    padding: 0;
    font-family: serif;
    line-height: 1.6;
}

p {
    margin: 0.5em 1em;
    text-indent: 0;
}

.empty-page {
    color: #999;
    font-style: italic;
    text-align: center;
    padding: 2em 0;
}

.page-image {
    text-align: center;
}

img {
    max-width: 100%;
    height: auto;
}

.footnotes {
    margin-top: 1.5em;
    border-top: 1px solid #999;
    font-size: 0.85em;
}

p.footnote {
    margin: 0.25em 1em;
}

.cover {
    text-align: center;
}

.title-page {
    text-align: center;
    padding-top: 30%;
}
"#;
