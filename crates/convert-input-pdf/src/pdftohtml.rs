//! Run `pdftohtml -xml` and parse its XML output.
//!
//! pdftohtml (poppler) reports per-page text runs with geometry and font ids,
//! extracted images, and the document outline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use convert_core::error::{ConvertError, Result};

use crate::render::check_tool;

/// A font specification from the pdftohtml XML output.
#[derive(Debug, Clone)]
pub struct FontSpec {
    pub id: u32,
    pub size: f64,
    pub family: String,
}

/// A positioned run of text on a page.
#[derive(Debug, Clone)]
pub struct TextElement {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub font_id: u32,
    /// Escaped inner markup; may contain `<b>`, `<i>`, `<a>`, `<sup>`, `<sub>`.
    pub inner_html: String,
}

impl TextElement {
    /// Plain text with tags stripped and entities decoded.
    pub fn inner_text(&self) -> String {
        Self::strip_tags(&self.inner_html)
    }

    /// Strip tags from escaped inline markup and decode the entities.
    pub fn strip_tags(html: &str) -> String {
        let mut result = String::with_capacity(html.len());
        let mut in_tag = false;
        for ch in html.chars() {
            match ch {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ if !in_tag => result.push(ch),
                _ => {}
            }
        }
        result
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&amp;", "&")
    }
}

/// An image placed on a page.
#[derive(Debug, Clone)]
pub struct ImageElement {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub src: String,
}

#[derive(Debug, Clone)]
pub struct PdfPage {
    pub number: u32,
    pub width: f64,
    pub height: f64,
    pub text_elements: Vec<TextElement>,
    pub images: Vec<ImageElement>,
}

/// An outline/bookmark entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineItem {
    pub title: String,
    pub page: u32,
    pub children: Vec<OutlineItem>,
}

/// Parsed pdftohtml output. Extracted image files live in `image_dir`
/// for as long as this value is alive.
pub struct LayoutDocument {
    pub fonts: Vec<FontSpec>,
    pub pages: Vec<PdfPage>,
    pub outline: Vec<OutlineItem>,
    pub image_dir: PathBuf,
    _tmp_dir: tempfile::TempDir,
}

/// Run `pdftohtml -xml` on a PDF and parse the resulting XML.
pub fn run_pdftohtml_xml(pdf_path: &Path) -> Result<LayoutDocument> {
    check_tool("pdftohtml").map_err(ConvertError::Pdf)?;

    let tmp_dir = tempfile::TempDir::new()
        .map_err(|e| ConvertError::Pdf(format!("Failed to create temp dir: {}", e)))?;

    let output_base = tmp_dir.path().join("output");

    log::info!("Running pdftohtml -xml on {}...", pdf_path.display());

    let output = Command::new("pdftohtml")
        .arg("-xml")
        .arg("-enc")
        .arg("UTF-8")
        .arg("-noframes")
        .arg("-nomerge")
        .arg("-nodrm")
        .arg("-fmt")
        .arg("jpg")
        .arg(pdf_path.as_os_str())
        .arg(output_base.as_os_str())
        .output()
        .map_err(|e| ConvertError::Pdf(format!("Failed to run pdftohtml: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConvertError::Pdf(format!(
            "pdftohtml failed: {}",
            stderr.trim()
        )));
    }

    let xml_path = tmp_dir.path().join("output.xml");
    let xml_content = std::fs::read_to_string(&xml_path).map_err(|e| {
        ConvertError::Pdf(format!(
            "Failed to read pdftohtml XML output at {}: {}",
            xml_path.display(),
            e
        ))
    })?;

    let parsed = parse_pdftohtml_xml(&xml_content)?;

    log::info!(
        "pdftohtml: {} fonts, {} pages, {} outline items",
        parsed.fonts.len(),
        parsed.pages.len(),
        parsed.outline.len()
    );

    Ok(LayoutDocument {
        fonts: parsed.fonts,
        pages: parsed.pages,
        outline: parsed.outline,
        image_dir: tmp_dir.path().to_path_buf(),
        _tmp_dir: tmp_dir,
    })
}

#[derive(Debug, Default)]
struct ParsedXml {
    fonts: Vec<FontSpec>,
    pages: Vec<PdfPage>,
    outline: Vec<OutlineItem>,
}

/// Inline tags kept inside text runs.
const INLINE_TAGS: &[&str] = &["b", "i", "a", "sup", "sub"];

fn parse_pdftohtml_xml(xml: &str) -> Result<ParsedXml> {
    let mut reader = Reader::from_str(xml);
    let mut parsed = ParsedXml::default();

    let mut current_page: Option<PdfPage> = None;
    let mut current_text: Option<TextElement> = None;

    // One vec per open <outline>; nested outlines attach to the last item
    // of the enclosing level when they close.
    let mut outline_stack: Vec<Vec<OutlineItem>> = Vec::new();
    let mut current_item: Option<(u32, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name();
                let tag = std::str::from_utf8(local.as_ref()).unwrap_or("");
                match tag {
                    "page" => current_page = Some(parse_page(e)),
                    "fontspec" => parsed.fonts.push(parse_fontspec(e)),
                    "text" => current_text = Some(parse_text(e)),
                    "outline" => outline_stack.push(Vec::new()),
                    "item" if !outline_stack.is_empty() => {
                        let page = attr_num(&parse_attrs(e), "page").unwrap_or(1.0) as u32;
                        current_item = Some((page, String::new()));
                    }
                    tag if INLINE_TAGS.contains(&tag) => {
                        if let Some(te) = current_text.as_mut() {
                            te.inner_html.push('<');
                            te.inner_html.push_str(tag);
                            if tag == "a" {
                                // Links into pdftohtml's own pages have no target in the book.
                                if let Some(href) =
                                    parse_attrs(e).get("href").filter(|h| is_external_link(h))
                                {
                                    te.inner_html.push_str(" href=\"");
                                    te.inner_html
                                        .push_str(&convert_utils::xml::escape_xml_attr(href));
                                    te.inner_html.push('"');
                                }
                            }
                            te.inner_html.push('>');
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let local = e.local_name();
                let tag = std::str::from_utf8(local.as_ref()).unwrap_or("");
                match tag {
                    "fontspec" => parsed.fonts.push(parse_fontspec(e)),
                    "image" => {
                        if let Some(page) = current_page.as_mut() {
                            page.images.push(parse_image(e));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = match e.unescape() {
                    Ok(t) => t,
                    Err(_) => continue,
                };
                if let Some(te) = current_text.as_mut() {
                    te.inner_html
                        .push_str(&convert_utils::xml::escape_xml_text(&text));
                } else if let Some((_, title)) = current_item.as_mut() {
                    title.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let local = e.local_name();
                let tag = std::str::from_utf8(local.as_ref()).unwrap_or("");
                match tag {
                    "page" => {
                        if let Some(page) = current_page.take() {
                            parsed.pages.push(page);
                        }
                    }
                    "text" => {
                        if let (Some(te), Some(page)) = (current_text.take(), current_page.as_mut())
                        {
                            page.text_elements.push(te);
                        }
                    }
                    "item" => {
                        if let (Some((page, title)), Some(level)) =
                            (current_item.take(), outline_stack.last_mut())
                        {
                            level.push(OutlineItem {
                                title: title.trim().to_string(),
                                page,
                                children: Vec::new(),
                            });
                        }
                    }
                    "outline" => {
                        if let Some(level) = outline_stack.pop() {
                            match outline_stack.last_mut() {
                                Some(parent) => match parent.last_mut() {
                                    Some(parent_item) => parent_item.children.extend(level),
                                    None => parent.extend(level),
                                },
                                None => parsed.outline = level,
                            }
                        }
                    }
                    tag if INLINE_TAGS.contains(&tag) => {
                        if let Some(te) = current_text.as_mut() {
                            te.inner_html.push_str("</");
                            te.inner_html.push_str(tag);
                            te.inner_html.push('>');
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                if parsed.pages.is_empty() && current_page.is_none() {
                    return Err(ConvertError::Xml(format!(
                        "Malformed pdftohtml output at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                log::warn!("pdftohtml XML truncated: {}", e);
                break;
            }
            _ => {}
        }
    }

    Ok(parsed)
}

fn parse_page(e: &BytesStart) -> PdfPage {
    let attrs = parse_attrs(e);
    PdfPage {
        number: attr_num(&attrs, "number").unwrap_or(0.0) as u32,
        width: attr_num(&attrs, "width").unwrap_or(0.0),
        height: attr_num(&attrs, "height").unwrap_or(0.0),
        text_elements: Vec::new(),
        images: Vec::new(),
    }
}

fn parse_fontspec(e: &BytesStart) -> FontSpec {
    let attrs = parse_attrs(e);
    FontSpec {
        id: attr_num(&attrs, "id").unwrap_or(0.0) as u32,
        size: attr_num(&attrs, "size").unwrap_or(0.0),
        family: attrs.get("family").cloned().unwrap_or_default(),
    }
}

fn parse_text(e: &BytesStart) -> TextElement {
    let attrs = parse_attrs(e);
    TextElement {
        top: attr_num(&attrs, "top").unwrap_or(0.0),
        left: attr_num(&attrs, "left").unwrap_or(0.0),
        width: attr_num(&attrs, "width").unwrap_or(0.0),
        height: attr_num(&attrs, "height").unwrap_or(0.0),
        font_id: attr_num(&attrs, "font").unwrap_or(0.0) as u32,
        inner_html: String::new(),
    }
}

fn parse_image(e: &BytesStart) -> ImageElement {
    let attrs = parse_attrs(e);
    ImageElement {
        top: attr_num(&attrs, "top").unwrap_or(0.0),
        left: attr_num(&attrs, "left").unwrap_or(0.0),
        width: attr_num(&attrs, "width").unwrap_or(0.0),
        height: attr_num(&attrs, "height").unwrap_or(0.0),
        src: attrs.get("src").cloned().unwrap_or_default(),
    }
}

fn is_external_link(href: &str) -> bool {
    href.contains("://") || href.starts_with("mailto:")
}

fn attr_num(attrs: &HashMap<String, String>, key: &str) -> Option<f64> {
    attrs.get(key).and_then(|v| v.trim().parse().ok())
}

fn parse_attrs(e: &BytesStart) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = match attr.unescape_value() {
            Ok(v) => v.to_string(),
            Err(_) => String::from_utf8_lossy(&attr.value).to_string(),
        };
        map.insert(key, value);
    }
    map
}
