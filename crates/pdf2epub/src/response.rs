//! The JSON verdict printed when the adapter finishes.
//!
//! Consumers compare these lines byte for byte, so the text uses `", "` and
//! `": "` separators and escapes everything outside printable ASCII as
//! lowercase `\uXXXX` (surrogate pairs above the BMP).

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::Formatter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    /// Write the verdict followed by a newline and flush.
    pub fn write_line<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let mut ser = serde_json::Serializer::with_formatter(&mut *out, AsciiFormatter);
        self.serialize(&mut ser)?;
        out.write_all(b"\n")?;
        out.flush()
    }
}

/// Compact JSON with spaced separators and ASCII-only output.
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(result: &ConversionResult) -> String {
        let mut buf = Vec::new();
        result.write_line(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_success_line() {
        assert_eq!(render(&ConversionResult::ok()), "{\"success\": true}\n");
    }

    #[test]
    fn test_failure_line() {
        assert_eq!(
            render(&ConversionResult::failure("No arguments provided")),
            "{\"success\": false, \"error\": \"No arguments provided\"}\n"
        );
    }

    #[test]
    fn test_escaping() {
        let line = render(&ConversionResult::failure(
            "caf\u{e9} \"q\" \\ tab\there\n\u{7f}\u{1f600}",
        ));
        assert_eq!(
            line,
            "{\"success\": false, \"error\": \"caf\\u00e9 \\\"q\\\" \\\\ tab\\there\\n\\u007f\\ud83d\\ude00\"}\n"
        );
        assert!(line.is_ascii());
    }
}
