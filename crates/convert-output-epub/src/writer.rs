//! EPUB writer: assembles an EPUB 2 container from a BookDocument.

use std::path::Path;

use convert_core::book::{BookDocument, TocEntry};
use convert_core::error::{ConvertError, Result};
use convert_utils::archive::ZipBuilder;
use convert_utils::xml::XmlBuilder;

const OEBPS: &str = "OEBPS";
const FALLBACK_UID: &str = "urn:uuid:00000000-0000-0000-0000-000000000000";

/// Write a BookDocument as an EPUB file.
pub fn write_epub(book: &BookDocument, output_path: &Path) -> Result<()> {
    let mut zip = ZipBuilder::new(output_path).map_err(|e| {
        ConvertError::Epub(format!(
            "Failed to create {}: {}",
            output_path.display(),
            e
        ))
    })?;

    // mimetype must be the first entry, stored uncompressed.
    zip.add_stored("mimetype", b"application/epub+zip")
        .map_err(|e| write_error("mimetype", e))?;

    zip.add_file("META-INF/container.xml", generate_container_xml().as_bytes())
        .map_err(|e| write_error("container.xml", e))?;

    for item in book.manifest.iter() {
        let path = format!("{}/{}", OEBPS, item.href);
        let data = item.data.as_bytes();
        let written = if is_precompressed_media(&item.media_type) {
            zip.add_stored(&path, data)
        } else {
            zip.add_file(&path, data)
        };
        written.map_err(|e| write_error(&path, e))?;
    }

    zip.add_file("OEBPS/content.opf", generate_opf(book).as_bytes())
        .map_err(|e| write_error("content.opf", e))?;

    zip.add_file("OEBPS/toc.ncx", generate_ncx(book).as_bytes())
        .map_err(|e| write_error("toc.ncx", e))?;

    zip.finish()
        .map_err(|e| ConvertError::Epub(format!("Failed to finalize EPUB: {}", e)))?;

    log::info!(
        "EPUB written: {} ({} manifest items, {} spine items)",
        output_path.display(),
        book.manifest.len(),
        book.spine.len()
    );
    Ok(())
}

fn write_error(what: &str, e: std::io::Error) -> ConvertError {
    ConvertError::Epub(format!("Failed to write {}: {}", what, e))
}

/// Media that is already compressed; deflating it again gains nothing.
fn is_precompressed_media(media_type: &str) -> bool {
    matches!(
        media_type,
        "image/png" | "image/jpeg" | "image/gif" | "image/webp"
    )
}

fn generate_container_xml() -> String {
    let mut xml = XmlBuilder::new();
    xml.open_tag(
        "container",
        &[
            ("version", "1.0"),
            ("xmlns", "urn:oasis:names:tc:opendocument:xmlns:container"),
        ],
    )
    .open_tag("rootfiles", &[])
    .empty_tag(
        "rootfile",
        &[
            ("full-path", "OEBPS/content.opf"),
            ("media-type", "application/oebps-package+xml"),
        ],
    )
    .close_tag("rootfiles")
    .close_tag("container");
    xml.build()
}

fn generate_opf(book: &BookDocument) -> String {
    let uid = book.uid.as_deref().unwrap_or(FALLBACK_UID);
    let title = book.metadata.title().unwrap_or("Untitled");
    let language = book.metadata.language().unwrap_or("en");

    let mut xml = XmlBuilder::new();
    xml.open_tag(
        "package",
        &[
            ("xmlns", "http://www.idpf.org/2007/opf"),
            ("unique-identifier", "bookid"),
            ("version", "2.0"),
        ],
    );

    xml.open_tag(
        "metadata",
        &[
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:opf", "http://www.idpf.org/2007/opf"),
        ],
    );
    xml.text_element("dc:title", title, &[]);
    xml.text_element("dc:language", language, &[]);
    xml.text_element("dc:identifier", uid, &[("id", "bookid")]);
    for author in book.metadata.authors() {
        xml.text_element(
            "dc:creator",
            author,
            &[("opf:role", "aut"), ("opf:file-as", author)],
        );
    }
    if let Some(desc) = book.metadata.description() {
        xml.text_element("dc:description", desc, &[]);
    }
    // EPUB 2 readers find the cover picture through this meta.
    if let Some(cover_id) = book
        .metadata
        .cover_image()
        .filter(|id| book.manifest.contains_id(id))
    {
        xml.empty_tag("meta", &[("name", "cover"), ("content", cover_id)]);
    }
    xml.close_tag("metadata");

    xml.open_tag("manifest", &[]);
    xml.empty_tag(
        "item",
        &[
            ("id", "ncx"),
            ("href", "toc.ncx"),
            ("media-type", "application/x-dtbncx+xml"),
        ],
    );
    for item in book.manifest.iter() {
        xml.empty_tag(
            "item",
            &[
                ("id", &item.id),
                ("href", &item.href),
                ("media-type", &item.media_type),
            ],
        );
    }
    xml.close_tag("manifest");

    xml.open_tag("spine", &[("toc", "ncx")]);
    for spine_item in book.spine.iter() {
        if spine_item.linear {
            xml.empty_tag("itemref", &[("idref", &spine_item.idref)]);
        } else {
            xml.empty_tag(
                "itemref",
                &[("idref", &spine_item.idref), ("linear", "no")],
            );
        }
    }
    xml.close_tag("spine");

    if !book.guide.is_empty() {
        xml.open_tag("guide", &[]);
        for guide_ref in book.guide.iter() {
            xml.empty_tag(
                "reference",
                &[
                    ("type", &guide_ref.ref_type),
                    ("title", &guide_ref.title),
                    ("href", &guide_ref.href),
                ],
            );
        }
        xml.close_tag("guide");
    }

    xml.close_tag("package");
    xml.build()
}

fn generate_ncx(book: &BookDocument) -> String {
    let uid = book.uid.as_deref().unwrap_or(FALLBACK_UID);
    let title = book.metadata.title().unwrap_or("Untitled");

    // navMap needs at least one navPoint.
    let fallback;
    let entries: &[TocEntry] = if book.toc.is_empty() {
        fallback = first_content_href(book)
            .map(|href| vec![TocEntry::new(title, href)])
            .unwrap_or_default();
        &fallback
    } else {
        &book.toc.entries
    };
    let depth = book.toc.depth().max(1).to_string();

    let mut xml = XmlBuilder::new();
    xml.raw("<!DOCTYPE ncx PUBLIC \"-//NISO//DTD ncx 2005-1//EN\" \"http://www.daisy.org/z3986/2005/ncx-2005-1.dtd\">\n");
    xml.open_tag(
        "ncx",
        &[
            ("xmlns", "http://www.daisy.org/z3986/2005/ncx/"),
            ("version", "2005-1"),
        ],
    );

    xml.open_tag("head", &[]);
    xml.empty_tag("meta", &[("name", "dtb:uid"), ("content", uid)]);
    xml.empty_tag("meta", &[("name", "dtb:depth"), ("content", &depth)]);
    xml.empty_tag("meta", &[("name", "dtb:totalPageCount"), ("content", "0")]);
    xml.empty_tag("meta", &[("name", "dtb:maxPageNumber"), ("content", "0")]);
    xml.close_tag("head");

    xml.open_tag("docTitle", &[]);
    xml.text_element("text", title, &[]);
    xml.close_tag("docTitle");

    for author in book.metadata.authors() {
        xml.open_tag("docAuthor", &[]);
        xml.text_element("text", author, &[]);
        xml.close_tag("docAuthor");
    }

    xml.open_tag("navMap", &[]);
    let mut play_order = 1;
    for entry in entries {
        write_nav_point(&mut xml, entry, &mut play_order);
    }
    xml.close_tag("navMap");

    xml.close_tag("ncx");
    xml.build()
}

fn first_content_href(book: &BookDocument) -> Option<&str> {
    book.spine
        .iter()
        .find_map(|s| book.manifest.by_id(&s.idref))
        .map(|item| item.href.as_str())
}

/// Writes `entry` and its children as nested navPoints, numbering
/// playOrder depth-first.
fn write_nav_point(xml: &mut XmlBuilder, entry: &TocEntry, play_order: &mut u32) {
    let id = format!("navPoint-{}", play_order);
    let po = play_order.to_string();
    *play_order += 1;

    xml.open_tag("navPoint", &[("id", &id), ("playOrder", &po)]);
    xml.open_tag("navLabel", &[]);
    xml.text_element("text", &entry.title, &[]);
    xml.close_tag("navLabel");
    xml.empty_tag("content", &[("src", &entry.href)]);
    for child in &entry.children {
        write_nav_point(xml, child, play_order);
    }
    xml.close_tag("navPoint");
}

#[cfg(test)]
mod tests {
    use super::*;
    use convert_core::book::{GuideRef, ManifestData, ManifestItem};
    use convert_utils::archive::{list_zip_entries, read_zip_entry};

    fn make_test_book() -> BookDocument {
        let mut book = BookDocument::new();
        book.uid = Some("test-uid-123".to_string());
        book.metadata.set_title("Test Book");
        book.metadata.add_author("Test Author");
        book.metadata.set_language("en");

        book.manifest.add(ManifestItem::new(
            "ch1",
            "chapter1.xhtml",
            "application/xhtml+xml",
            ManifestData::Xhtml("<html><body><p>Hello</p></body></html>".to_string()),
        ));
        book.spine.push("ch1", true);
        book.toc.add(TocEntry::new("Chapter 1", "chapter1.xhtml"));

        book
    }

    #[test]
    fn test_generate_container_xml() {
        let xml = generate_container_xml();
        assert!(xml.contains("OEBPS/content.opf"));
        assert!(xml.contains("urn:oasis:names:tc:opendocument:xmlns:container"));
    }

    #[test]
    fn test_generate_opf() {
        let mut book = make_test_book();
        book.guide
            .add(GuideRef::new("cover", "Cover", "chapter1.xhtml"));
        let opf = generate_opf(&book);

        assert!(opf.contains("<dc:title>Test Book</dc:title>"));
        assert!(opf.contains("opf:role=\"aut\""));
        assert!(opf.contains(">Test Author</dc:creator>"));
        assert!(opf.contains("<dc:identifier id=\"bookid\">test-uid-123</dc:identifier>"));
        assert!(opf.contains("idref=\"ch1\""));
        assert!(opf.contains("<reference type=\"cover\""));
        assert!(!opf.contains("name=\"cover\""));
    }

    #[test]
    fn test_opf_cover_meta() {
        let mut book = make_test_book();
        book.manifest.add(ManifestItem::new(
            "cover-image",
            "images/cover.jpg",
            "image/jpeg",
            ManifestData::Binary(vec![0xFF, 0xD8, 0xFF]),
        ));
        book.metadata.set_cover_image("cover-image");

        let opf = generate_opf(&book);
        assert!(opf.contains("<meta name=\"cover\" content=\"cover-image\"/>"));
    }

    #[test]
    fn test_generate_nested_ncx() {
        let mut book = make_test_book();
        let mut part = TocEntry::new("Part II", "chapter1.xhtml#p2");
        part.add_child(TocEntry::new("Section A", "chapter1.xhtml#a"));
        book.toc.add(part);
        book.toc.add(TocEntry::new("Epilogue", "chapter1.xhtml#e"));

        let ncx = generate_ncx(&book);

        assert!(ncx.contains("<meta name=\"dtb:depth\" content=\"2\"/>"));
        assert!(ncx.contains("id=\"navPoint-3\" playOrder=\"3\""));
        assert!(ncx.contains("id=\"navPoint-4\" playOrder=\"4\""));

        // Section A sits inside Part II.
        let part_at = ncx.find("Part II").unwrap();
        let section_at = ncx.find("Section A").unwrap();
        let epilogue_at = ncx.find("Epilogue").unwrap();
        let part_close = ncx[part_at..].find("</navPoint>").unwrap() + part_at;
        assert!(section_at < part_close);
        assert!(part_close < epilogue_at);
    }

    #[test]
    fn test_empty_toc_points_at_first_page() {
        let mut book = make_test_book();
        book.toc = Default::default();

        let ncx = generate_ncx(&book);
        assert!(ncx.contains("<content src=\"chapter1.xhtml\"/>"));
        assert!(ncx.contains("<text>Test Book</text>"));
    }

    #[test]
    fn test_write_epub() {
        let mut book = make_test_book();
        book.manifest.add(ManifestItem::new(
            "img",
            "images/a.jpg",
            "image/jpeg",
            ManifestData::Binary(vec![1, 2, 3]),
        ));
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.epub");

        write_epub(&book, &path).unwrap();

        let entries = list_zip_entries(&path).unwrap();
        assert_eq!(entries[0], "mimetype");
        assert!(entries.contains(&"OEBPS/chapter1.xhtml".to_string()));
        assert!(entries.contains(&"OEBPS/images/a.jpg".to_string()));
        assert!(entries.contains(&"OEBPS/toc.ncx".to_string()));
        assert_eq!(
            read_zip_entry(&path, "mimetype").unwrap(),
            b"application/epub+zip"
        );
        assert_eq!(read_zip_entry(&path, "OEBPS/images/a.jpg").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("no/such/dir/out.epub");
        let err = write_epub(&make_test_book(), &path).unwrap_err();
        assert!(matches!(err, ConvertError::Epub(_)));
    }
}
