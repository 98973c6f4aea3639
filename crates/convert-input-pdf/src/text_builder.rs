//! XHTML generation for text-based PDF pages.
//!
//! Groups text elements into lines and paragraphs, interleaves images,
//! separates the footnote zone at the bottom of the page, and produces
//! semantic XHTML suitable for reflowable EPUB.

use std::cmp::Ordering;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::pdftohtml::{FontSpec, ImageElement, PdfPage, TextElement};

/// Vertical distance under which two elements share a line.
const LINE_TOLERANCE: f64 = 3.0;
/// A gap this many times the average line gap starts a new paragraph.
const PARAGRAPH_GAP_FACTOR: f64 = 1.5;
/// Footnotes only start in the lower part of the page.
const FOOTNOTE_ZONE_START: f64 = 0.6;
/// Footnote text is set smaller than the body.
const FOOTNOTE_SIZE_RATIO: f64 = 0.9;

static FOOTNOTE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\d{1,3}|[*†‡§¶])(?:[.)]|\s|$)").expect("footnote marker regex")
});

#[derive(Debug)]
struct TextLine {
    top: f64,
    height: f64,
    /// Largest font size on the line.
    size: f64,
    /// Fragments sorted by left position, with their inner HTML.
    fragments: Vec<(f64, String)>,
}

impl TextLine {
    fn html(&self) -> String {
        self.fragments
            .iter()
            .map(|(_, html)| html.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn starts_with_marker(&self) -> bool {
        let Some((_, first)) = self.fragments.first() else {
            return false;
        };
        if first.trim_start().starts_with("<sup>") {
            return true;
        }
        let plain = TextElement::strip_tags(first);
        FOOTNOTE_MARKER.is_match(&plain)
    }
}

#[derive(Debug)]
enum ContentBlock {
    Paragraph(String),
    Image { src: String, alt: String },
}

/// Build an XHTML page for a text-based PDF page.
///
/// `image_map` maps pdftohtml image `src` names to their EPUB `href` paths.
/// Detected footnotes are appended after the body when `include_footnotes`
/// is set and dropped otherwise.
pub fn build_text_page_xhtml(
    page: &PdfPage,
    fonts: &[FontSpec],
    image_map: &HashMap<String, String>,
    include_footnotes: bool,
) -> String {
    let lines = group_into_lines(&page.text_elements, fonts);
    let body_size = body_font_size(&page.text_elements, fonts);
    let (body_lines, footnote_lines) = split_footnotes(lines, page.height, body_size);

    let blocks = build_content_blocks(&body_lines, &page.images, image_map);
    let footnotes = group_footnotes(&footnote_lines);

    let mut body = String::new();
    body.push_str("  <div class=\"page\">\n");

    if blocks.is_empty() && footnotes.is_empty() {
        body.push_str(&format!(
            "    <p class=\"empty-page\">[Page {}]</p>\n",
            page.number
        ));
    }

    for block in &blocks {
        match block {
            ContentBlock::Paragraph(html) => {
                body.push_str("    <p>");
                body.push_str(html);
                body.push_str("</p>\n");
            }
            ContentBlock::Image { src, alt } => {
                body.push_str(&format!(
                    "    <div class=\"page-image\"><img src=\"{}\" alt=\"{}\"/></div>\n",
                    convert_utils::xml::escape_xml_attr(src),
                    convert_utils::xml::escape_xml_attr(alt),
                ));
            }
        }
    }

    if !footnotes.is_empty() {
        if include_footnotes {
            body.push_str("    <div class=\"footnotes\">\n");
            for note in &footnotes {
                body.push_str("      <p class=\"footnote\">");
                body.push_str(note);
                body.push_str("</p>\n");
            }
            body.push_str("    </div>\n");
        } else {
            log::debug!(
                "Dropping {} footnote(s) on page {}",
                footnotes.len(),
                page.number
            );
        }
    }

    body.push_str("  </div>");

    convert_utils::xml::xhtml11_document(
        &format!("Page {}", page.number),
        "en",
        Some("style.css"),
        &body,
    )
}

fn element_size(elem: &TextElement, fonts: &[FontSpec]) -> f64 {
    fonts
        .iter()
        .find(|f| f.id == elem.font_id)
        .map(|f| f.size)
        .filter(|size| *size > 0.0)
        .unwrap_or(elem.height)
}

/// The font size carrying the most characters on the page.
fn body_font_size(elements: &[TextElement], fonts: &[FontSpec]) -> f64 {
    // Sizes are bucketed to a tenth of a point.
    let mut weights: HashMap<i64, usize> = HashMap::new();
    for elem in elements {
        let chars = elem.inner_text().trim().chars().count();
        if chars == 0 {
            continue;
        }
        let bucket = (element_size(elem, fonts) * 10.0).round() as i64;
        *weights.entry(bucket).or_default() += chars;
    }

    weights
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(bucket, _)| bucket as f64 / 10.0)
        .unwrap_or(0.0)
}

/// Group text elements into lines based on vertical position.
fn group_into_lines(elements: &[TextElement], fonts: &[FontSpec]) -> Vec<TextLine> {
    let mut sorted: Vec<_> = elements.iter().collect();
    sorted.sort_by(|a, b| {
        cmp_f64(a.top, b.top).then(cmp_f64(a.left, b.left))
    });

    let mut lines: Vec<TextLine> = Vec::new();

    for elem in sorted {
        if elem.inner_text().trim().is_empty() {
            continue;
        }
        let size = element_size(elem, fonts);

        match lines
            .iter_mut()
            .find(|line| (line.top - elem.top).abs() < LINE_TOLERANCE)
        {
            Some(line) => {
                line.fragments.push((elem.left, elem.inner_html.clone()));
                line.size = line.size.max(size);
            }
            None => lines.push(TextLine {
                top: elem.top,
                height: elem.height,
                size,
                fragments: vec![(elem.left, elem.inner_html.clone())],
            }),
        }
    }

    for line in &mut lines {
        line.fragments.sort_by(|a, b| cmp_f64(a.0, b.0));
    }
    lines.sort_by(|a, b| cmp_f64(a.top, b.top));

    lines
}

/// Split lines into body lines and footnote-zone lines.
///
/// The zone opens at the first small-type line in the lower part of the page
/// that starts with a footnote marker. After that, small-type lines belong to
/// the zone and anything set at body size (running footers, page numbers)
/// stays with the body.
fn split_footnotes(
    lines: Vec<TextLine>,
    page_height: f64,
    body_size: f64,
) -> (Vec<TextLine>, Vec<TextLine>) {
    if page_height <= 0.0 || body_size <= 0.0 {
        return (lines, Vec::new());
    }

    let is_small = |line: &TextLine| line.size < body_size * FOOTNOTE_SIZE_RATIO;
    let zone_top = page_height * FOOTNOTE_ZONE_START;

    let start = lines
        .iter()
        .position(|line| line.top >= zone_top && is_small(line) && line.starts_with_marker());

    let Some(start) = start else {
        return (lines, Vec::new());
    };

    let mut body = Vec::new();
    let mut notes = Vec::new();
    for (i, line) in lines.into_iter().enumerate() {
        if i >= start && is_small(&line) {
            notes.push(line);
        } else {
            body.push(line);
        }
    }
    (body, notes)
}

/// Each marker line starts a footnote; other lines continue the previous one.
fn group_footnotes(lines: &[TextLine]) -> Vec<String> {
    let mut notes: Vec<String> = Vec::new();
    for line in lines {
        let html = line.html();
        match notes.last_mut() {
            Some(current) if !line.starts_with_marker() => {
                current.push(' ');
                current.push_str(&html);
            }
            _ => notes.push(html),
        }
    }
    notes
}

/// Build content blocks (paragraphs and images) from lines and images.
fn build_content_blocks(
    lines: &[TextLine],
    images: &[ImageElement],
    image_map: &HashMap<String, String>,
) -> Vec<ContentBlock> {
    enum Item<'a> {
        Line(&'a TextLine),
        Image(&'a ImageElement, &'a String),
    }

    let para_threshold = compute_avg_line_gap(lines) * PARAGRAPH_GAP_FACTOR;

    let mut items: Vec<(f64, Item)> = lines.iter().map(|l| (l.top, Item::Line(l))).collect();
    for img in images {
        if let Some(href) = image_map.get(&img.src) {
            items.push((img.top, Item::Image(img, href)));
        }
    }
    items.sort_by(|a, b| cmp_f64(a.0, b.0));

    let mut blocks: Vec<ContentBlock> = Vec::new();
    let mut current_para_lines: Vec<String> = Vec::new();
    let mut last_line_bottom: Option<f64> = None;

    for (_, item) in items {
        match item {
            Item::Line(line) => {
                if let Some(prev_bottom) = last_line_bottom {
                    if line.top - prev_bottom > para_threshold && !current_para_lines.is_empty() {
                        blocks.push(ContentBlock::Paragraph(current_para_lines.join(" ")));
                        current_para_lines.clear();
                    }
                }
                current_para_lines.push(line.html());
                last_line_bottom = Some(line.top + line.height);
            }
            Item::Image(img, href) => {
                if !current_para_lines.is_empty() {
                    blocks.push(ContentBlock::Paragraph(current_para_lines.join(" ")));
                    current_para_lines.clear();
                    last_line_bottom = None;
                }
                blocks.push(ContentBlock::Image {
                    src: href.clone(),
                    alt: format!("Image at ({}, {})", img.left as u32, img.top as u32),
                });
            }
        }
    }

    if !current_para_lines.is_empty() {
        blocks.push(ContentBlock::Paragraph(current_para_lines.join(" ")));
    }

    blocks
}

fn compute_avg_line_gap(lines: &[TextLine]) -> f64 {
    let gaps: Vec<f64> = lines
        .windows(2)
        .map(|w| w[1].top - (w[0].top + w[0].height))
        .filter(|gap| *gap > 0.0)
        .collect();

    if gaps.is_empty() {
        return 10.0;
    }
    gaps.iter().sum::<f64>() / gaps.len() as f64
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_text(top: f64, left: f64, font_id: u32, html: &str) -> TextElement {
        TextElement {
            top,
            left,
            width: 200.0,
            height: 14.0,
            font_id,
            inner_html: html.to_string(),
        }
    }

    fn fonts() -> Vec<FontSpec> {
        vec![
            FontSpec {
                id: 0,
                size: 12.0,
                family: "Times".to_string(),
            },
            FontSpec {
                id: 1,
                size: 8.0,
                family: "Times".to_string(),
            },
        ]
    }

    fn page(number: u32, text_elements: Vec<TextElement>) -> PdfPage {
        PdfPage {
            number,
            width: 612.0,
            height: 792.0,
            text_elements,
            images: vec![],
        }
    }

    #[test]
    fn test_line_grouping() {
        let elements = vec![
            make_text(100.0, 160.0, 0, "world"),
            make_text(100.5, 50.0, 0, "Hello"),
            make_text(120.0, 50.0, 0, "Next line"),
        ];
        let lines = group_into_lines(&elements, &fonts());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].html(), "Hello world");
        assert_eq!(lines[1].html(), "Next line");
    }

    #[test]
    fn test_paragraph_detection() {
        let elements = vec![
            make_text(100.0, 50.0, 0, "Line 1"),
            make_text(116.0, 50.0, 0, "Line 2"),
            make_text(160.0, 50.0, 0, "Line 3"),
            make_text(176.0, 50.0, 0, "Line 4"),
        ];
        let lines = group_into_lines(&elements, &fonts());
        let blocks = build_content_blocks(&lines, &[], &HashMap::new());

        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], ContentBlock::Paragraph(t) if t == "Line 1 Line 2"));
        assert!(matches!(&blocks[1], ContentBlock::Paragraph(t) if t == "Line 3 Line 4"));
    }

    #[test]
    fn test_image_interleaving() {
        let elements = vec![
            make_text(100.0, 50.0, 0, "Before image"),
            make_text(400.0, 50.0, 0, "After image"),
        ];
        let images = vec![
            ImageElement {
                top: 200.0,
                left: 50.0,
                width: 300.0,
                height: 150.0,
                src: "output-1_1.jpg".to_string(),
            },
            ImageElement {
                top: 250.0,
                left: 50.0,
                width: 10.0,
                height: 10.0,
                src: "unmapped.jpg".to_string(),
            },
        ];
        let image_map = HashMap::from([(
            "output-1_1.jpg".to_string(),
            "images/page1_img1.jpg".to_string(),
        )]);

        let lines = group_into_lines(&elements, &fonts());
        let blocks = build_content_blocks(&lines, &images, &image_map);

        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[0], ContentBlock::Paragraph(_)));
        assert!(
            matches!(&blocks[1], ContentBlock::Image { src, .. } if src == "images/page1_img1.jpg")
        );
        assert!(matches!(&blocks[2], ContentBlock::Paragraph(_)));
    }

    #[test]
    fn test_body_font_size_is_char_weighted() {
        let elements = vec![
            make_text(100.0, 50.0, 1, "tiny but numerous words here"),
            make_text(120.0, 50.0, 0, "Body"),
            make_text(140.0, 50.0, 0, "text that dominates the page by far"),
        ];
        assert_eq!(body_font_size(&elements, &fonts()), 12.0);
    }

    #[test]
    fn test_footnotes_separated_from_body() {
        let p = page(
            3,
            vec![
                make_text(100.0, 50.0, 0, "Body text with a reference<sup>1</sup>."),
                make_text(116.0, 50.0, 0, "More body text."),
                make_text(700.0, 50.0, 1, "1 Smith, History, p. 4."),
                make_text(712.0, 50.0, 1, "continued note text."),
                make_text(724.0, 50.0, 1, "<sup>2</sup> Second note."),
                make_text(760.0, 300.0, 0, "3"),
            ],
        );
        let xhtml = build_text_page_xhtml(&p, &fonts(), &HashMap::new(), true);

        assert!(xhtml.contains("<div class=\"footnotes\">"));
        assert!(xhtml.contains(
            "<p class=\"footnote\">1 Smith, History, p. 4. continued note text.</p>"
        ));
        assert!(xhtml.contains("<p class=\"footnote\"><sup>2</sup> Second note.</p>"));
        assert!(xhtml.contains("<p>Body text with a reference<sup>1</sup>. More body text.</p>"));
        // Page number at body size stays in the body.
        assert!(xhtml.contains("<p>3</p>"));

        let footnotes_at = xhtml.find("footnotes").unwrap();
        let body_at = xhtml.find("More body text").unwrap();
        assert!(body_at < footnotes_at);
    }

    #[test]
    fn test_footnotes_dropped_when_disabled() {
        let p = page(
            1,
            vec![
                make_text(100.0, 50.0, 0, "Body text."),
                make_text(700.0, 50.0, 1, "* An aside."),
            ],
        );
        let xhtml = build_text_page_xhtml(&p, &fonts(), &HashMap::new(), false);

        assert!(xhtml.contains("<p>Body text.</p>"));
        assert!(!xhtml.contains("An aside"));
        assert!(!xhtml.contains("footnotes"));
    }

    #[test]
    fn test_small_text_high_on_page_is_not_a_footnote() {
        let p = page(
            1,
            vec![
                make_text(100.0, 50.0, 1, "1 Caption under a heading"),
                make_text(130.0, 50.0, 0, "Regular body paragraph text."),
            ],
        );
        let xhtml = build_text_page_xhtml(&p, &fonts(), &HashMap::new(), true);

        assert!(!xhtml.contains("footnotes"));
        assert!(xhtml.contains("1 Caption under a heading"));
    }

    #[test]
    fn test_small_text_without_marker_is_not_a_footnote() {
        let p = page(
            1,
            vec![
                make_text(100.0, 50.0, 0, "Regular body paragraph text."),
                make_text(700.0, 50.0, 1, "Printed in Norway"),
            ],
        );
        let xhtml = build_text_page_xhtml(&p, &fonts(), &HashMap::new(), true);
        assert!(!xhtml.contains("footnotes"));
    }

    #[test]
    fn test_build_text_page_xhtml() {
        let p = page(1, vec![make_text(100.0, 50.0, 0, "Hello world")]);
        let xhtml = build_text_page_xhtml(&p, &fonts(), &HashMap::new(), true);

        assert!(xhtml.contains("<title>Page 1</title>"));
        assert!(xhtml.contains("<p>Hello world</p>"));
        assert!(xhtml.contains("XHTML 1.1"));
    }

    #[test]
    fn test_empty_page_xhtml() {
        let xhtml = build_text_page_xhtml(&page(5, vec![]), &fonts(), &HashMap::new(), true);
        assert!(xhtml.contains("[Page 5]"));
    }
}
