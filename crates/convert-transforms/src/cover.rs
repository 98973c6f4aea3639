//! Cover transform: puts a cover page at the front of the reading order.

use convert_core::book::{BookDocument, GuideRef, ManifestData, ManifestItem};
use convert_core::error::Result;
use convert_core::options::ConversionOptions;
use convert_core::plugin::Transform;
use convert_utils::xml::{escape_xml_attr, escape_xml_text, xhtml11_document};

const STYLESHEET_HREF: &str = "style.css";

/// Inserts a cover page at spine[0] and registers it in the guide.
///
/// Shows the cover image when the input produced one, otherwise a
/// typographic title page built from the metadata.
pub struct Cover;

impl Transform for Cover {
    fn name(&self) -> &str {
        "Cover"
    }

    fn should_run(&self, options: &ConversionOptions) -> bool {
        options.includes_cover
    }

    fn apply(&self, book: &mut BookDocument, _options: &ConversionOptions) -> Result<()> {
        let title = book.metadata.title().unwrap_or("").to_string();
        let lang = book.metadata.language().unwrap_or("en").to_string();

        let image_href = book
            .metadata
            .cover_image()
            .and_then(|id| book.manifest.by_id(id))
            .filter(|item| item.is_image())
            .map(|item| item.href.clone());

        let body = match &image_href {
            Some(href) => format!(
                "  <div class=\"cover\"><img src=\"{}\" alt=\"{}\"/></div>",
                escape_xml_attr(href),
                escape_xml_attr(&title)
            ),
            None => title_page_body(&title, book.metadata.authors()),
        };

        let css = book
            .manifest
            .by_href(STYLESHEET_HREF)
            .map(|_| STYLESHEET_HREF);
        let xhtml = xhtml11_document(&title, &lang, css, &body);

        let id = book.manifest.unique_id("cover");
        let href = book.manifest.unique_href("cover", "xhtml");
        book.manifest.add(ManifestItem::new(
            &id,
            &href,
            "application/xhtml+xml",
            ManifestData::Xhtml(xhtml),
        ));
        book.spine.insert(0, &id, true);
        book.guide.add(GuideRef::new("cover", "Cover", &href));

        log::info!(
            "Inserted {} at spine[0]",
            if image_href.is_some() {
                "cover image page"
            } else {
                "title page"
            }
        );
        Ok(())
    }
}

fn title_page_body(title: &str, authors: &[String]) -> String {
    let mut body = String::from("  <div class=\"title-page\">\n");
    body.push_str(&format!(
        "    <h1 class=\"title\">{}</h1>\n",
        escape_xml_text(title)
    ));
    if !authors.is_empty() {
        body.push_str(&format!(
            "    <p class=\"authors\">{}</p>\n",
            escape_xml_text(&authors.join(", "))
        ));
    }
    body.push_str("  </div>");
    body
}
