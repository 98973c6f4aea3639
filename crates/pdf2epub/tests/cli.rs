//! End-to-end tests running the `pdf2epub` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use lopdf::{Dictionary, Document, Object, Stream};
use tempfile::TempDir;

fn pdf2epub() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pdf2epub"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

/// A one-page PDF with a line of Courier text.
fn write_sample_pdf(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Courier".to_vec()));
    let font_id = doc.add_object(font);

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    let resources_id = doc.add_object(resources);

    let content = b"BT /F1 24 Tf 72 700 Td (Hello World!) Tj ET".to_vec();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("Contents", Object::Reference(content_id));
    let page_id = doc.add_object(page);

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages.set("Count", Object::Integer(1));
    pages.set("Resources", Object::Reference(resources_id));
    pages.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ]),
    );
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).unwrap();
}

struct Fixture {
    _dir: TempDir,
    pdf: PathBuf,
    epub: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("in.pdf");
        let epub = dir.path().join("out.epub");
        write_sample_pdf(&pdf);
        Self {
            _dir: dir,
            pdf,
            epub,
        }
    }

    fn request(&self, extra: serde_json::Value) -> String {
        let mut request = serde_json::json!({
            "pdf_path": self.pdf,
            "epub_path": self.epub,
        });
        if let (Some(obj), Some(extra)) = (request.as_object_mut(), extra.as_object()) {
            obj.extend(extra.clone());
        }
        request.to_string()
    }

    fn opf(&self) -> String {
        let bytes = convert_utils::archive::read_zip_entry(&self.epub, "OEBPS/content.opf").unwrap();
        String::from_utf8(bytes).unwrap()
    }
}

#[test]
fn converts_with_default_title_and_no_author() {
    let fx = Fixture::new();
    let output = pdf2epub()
        .arg(fx.request(serde_json::json!({})))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "{\"success\": true}\n");
    assert!(fx.epub.exists());

    let opf = fx.opf();
    assert!(opf.contains("<dc:title>Untitled</dc:title>"), "{opf}");
    assert!(!opf.contains("<dc:creator"));
}

#[test]
fn applies_title_and_author() {
    let fx = Fixture::new();
    let output = pdf2epub()
        .arg(fx.request(serde_json::json!({"title": "My Book", "author": "Jane Doe"})))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "{\"success\": true}\n");

    let opf = fx.opf();
    assert!(opf.contains("<dc:title>My Book</dc:title>"));
    assert!(opf.contains(">Jane Doe</dc:creator>"));
}

#[test]
fn cover_is_first_in_spine() {
    let fx = Fixture::new();
    let output = pdf2epub()
        .arg(fx.request(serde_json::json!({"title": "Covered"})))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let opf = fx.opf();
    let spine = &opf[opf.find("<spine").unwrap()..];
    let first = spine.find("<itemref").unwrap();
    assert!(spine[first..].starts_with("<itemref idref=\"cover\""), "{spine}");
    assert!(opf.contains("<reference type=\"cover\""));
}

#[test]
fn extra_arguments_are_ignored() {
    let fx = Fixture::new();
    let output = pdf2epub()
        .arg(fx.request(serde_json::json!({})))
        .args(["--verbose", "extra"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(stdout(&output), "{\"success\": true}\n");
    assert!(fx.epub.exists());
}

#[test]
fn no_arguments_reports_on_stdout() {
    let output = pdf2epub().output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "{\"success\": false, \"error\": \"No arguments provided\"}\n"
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn invalid_json_reports_on_stderr() {
    let output = pdf2epub().arg("{\"pdf_path\": ").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let err = stderr(&output);
    assert!(err.starts_with("{\"success\": false, \"error\": \""), "{err}");
    assert!(err.ends_with("\"}\n"));
}

#[test]
fn missing_keys_report_on_stderr() {
    let output = pdf2epub()
        .arg(r#"{"pdf_path": "in.pdf"}"#)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("epub_path"));
}

#[test]
fn nonexistent_pdf_reports_on_stderr() {
    let dir = TempDir::new().unwrap();
    let epub = dir.path().join("out.epub");
    let request = serde_json::json!({
        "pdf_path": dir.path().join("nope.pdf"),
        "epub_path": epub,
    });

    let output = pdf2epub().arg(request.to_string()).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let err = stderr(&output);
    assert!(err.starts_with("{\"success\": false, \"error\": \""), "{err}");
    assert!(err.contains("Cannot open"));
    assert!(!epub.exists());
}

#[test]
fn logging_is_silent_by_default() {
    let fx = Fixture::new();
    let output = pdf2epub()
        .arg(fx.request(serde_json::json!({})))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stderr.is_empty(), "{}", stderr(&output));
}

#[test]
fn separator_before_request_is_not_skipped() {
    let fx = Fixture::new();
    let output = pdf2epub()
        .arg("--")
        .arg(fx.request(serde_json::json!({})))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).starts_with("{\"success\": false, \"error\": \"invalid request: "));
    assert!(!fx.epub.exists());
}
