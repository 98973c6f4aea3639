//! XML/XHTML writing helpers for OPF, NCX, container.xml and content pages.

/// Minimal indenting XML writer.
pub struct XmlBuilder {
    content: String,
    indent_level: usize,
}

impl XmlBuilder {
    pub fn new() -> Self {
        Self {
            content: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"),
            indent_level: 0,
        }
    }

    pub fn open_tag(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.start(name, attrs);
        self.content.push_str(">\n");
        self.indent_level += 1;
        self
    }

    pub fn close_tag(&mut self, name: &str) -> &mut Self {
        self.indent_level = self.indent_level.saturating_sub(1);
        self.indent();
        self.content.push_str("</");
        self.content.push_str(name);
        self.content.push_str(">\n");
        self
    }

    pub fn empty_tag(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.start(name, attrs);
        self.content.push_str("/>\n");
        self
    }

    pub fn text_element(&mut self, name: &str, text: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.start(name, attrs);
        self.content.push('>');
        self.content.push_str(&escape_xml_text(text));
        self.content.push_str("</");
        self.content.push_str(name);
        self.content.push_str(">\n");
        self
    }

    /// Append text verbatim (e.g. a DOCTYPE line).
    pub fn raw(&mut self, text: &str) -> &mut Self {
        self.content.push_str(text);
        self
    }

    pub fn build(self) -> String {
        self.content
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.indent();
        self.content.push('<');
        self.content.push_str(name);
        for (key, value) in attrs {
            self.content.push(' ');
            self.content.push_str(key);
            self.content.push_str("=\"");
            self.content.push_str(&escape_xml_attr(value));
            self.content.push('"');
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.indent_level {
            self.content.push_str("  ");
        }
    }
}

impl Default for XmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// XHTML 1.1 DOCTYPE for EPUB 2 compliance.
pub const XHTML11_DOCTYPE: &str =
    "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.1//EN\" \"http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd\">";

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Wrap `body` markup in a complete XHTML 1.1 document.
pub fn xhtml11_document(title: &str, lang: &str, css_href: Option<&str>, body: &str) -> String {
    let mut s = String::with_capacity(512 + body.len());
    s.push_str(XML_DECLARATION);
    s.push('\n');
    s.push_str(XHTML11_DOCTYPE);
    s.push('\n');
    s.push_str("<html xmlns=\"http://www.w3.org/1999/xhtml\" xml:lang=\"");
    s.push_str(&escape_xml_attr(lang));
    s.push_str("\">\n<head>\n  <title>");
    s.push_str(&escape_xml_text(title));
    s.push_str("</title>\n");
    if let Some(href) = css_href {
        s.push_str("  <link rel=\"stylesheet\" type=\"text/css\" href=\"");
        s.push_str(&escape_xml_attr(href));
        s.push_str("\"/>\n");
    }
    s.push_str("</head>\n<body>\n");
    s.push_str(body);
    s.push_str("\n</body>\n</html>");
    s
}

/// Render plain text as `<p>` elements, one per blank-line separated block.
/// Lines inside a block are joined with a single space.
pub fn text_to_paragraphs(text: &str, indent: &str) -> String {
    let mut out = String::new();
    for block in text.split("\n\n") {
        let joined = block
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            continue;
        }
        out.push_str(indent);
        out.push_str("<p>");
        out.push_str(&escape_xml_text(&joined));
        out.push_str("</p>\n");
    }
    out
}

/// Escape special characters in XML text content.
pub fn escape_xml_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape special characters in XML attribute values.
pub fn escape_xml_attr(s: &str) -> String {
    escape_xml_text(s).replace('"', "&quot;")
}
