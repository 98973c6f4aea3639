//! Page rendering via `pdftoppm` (poppler-utils).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use convert_core::error::{ConvertError, Result};

/// Check that an external tool is on the PATH. Without `which` the check
/// is skipped and the spawn itself reports a missing tool.
///
/// The error is a bare message; callers wrap it in their own error kind.
pub fn check_tool(tool: &str) -> std::result::Result<(), String> {
    match Command::new("which").arg(tool).output() {
        Ok(which) if !which.status.success() => Err(format!(
            "{} is required for this step but was not found on PATH",
            tool
        )),
        Ok(_) => Ok(()),
        Err(e) => {
            log::debug!("Cannot run which ({}); trying {} directly", e, tool);
            Ok(())
        }
    }
}

/// Render the given pages to JPEG. Returns page number -> JPEG bytes;
/// pages pdftoppm produced no file for are absent from the map.
pub fn render_pages(
    pdf_path: &Path,
    page_numbers: &[u32],
    total_pages: u32,
    dpi: u16,
    jpeg_quality: u8,
) -> Result<HashMap<u32, Vec<u8>>> {
    let mut rendered = HashMap::new();
    if page_numbers.is_empty() {
        return Ok(rendered);
    }

    check_tool("pdftoppm").map_err(ConvertError::Pdf)?;

    let ranges = contiguous_ranges(page_numbers);
    log::info!(
        "Rendering {} page(s) in {} batch(es) at {} DPI...",
        page_numbers.len(),
        ranges.len(),
        dpi
    );

    for (first, last) in ranges {
        let tmp_dir = tempfile::TempDir::new()
            .map_err(|e| ConvertError::Pdf(format!("Failed to create temp dir: {}", e)))?;
        let prefix = tmp_dir.path().join("page");

        let output = Command::new("pdftoppm")
            .arg("-jpeg")
            .arg("-jpegopt")
            .arg(format!("quality={}", jpeg_quality))
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(first.to_string())
            .arg("-l")
            .arg(last.to_string())
            .arg(pdf_path.as_os_str())
            .arg(prefix.as_os_str())
            .output()
            .map_err(|e| ConvertError::Pdf(format!("Failed to run pdftoppm: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConvertError::Pdf(format!(
                "pdftoppm failed for pages {}-{}: {}",
                first,
                last,
                stderr.trim()
            )));
        }

        for page_num in first..=last {
            if !page_numbers.contains(&page_num) {
                continue;
            }
            match find_rendered_page(tmp_dir.path(), page_num, total_pages) {
                Some(path) => {
                    let data = std::fs::read(&path).map_err(|e| {
                        ConvertError::Pdf(format!(
                            "Failed to read rendered page {}: {}",
                            page_num, e
                        ))
                    })?;
                    rendered.insert(page_num, data);
                }
                None => log::warn!("No rendered image found for page {}", page_num),
            }
        }
    }

    Ok(rendered)
}

/// Group page numbers into minimal contiguous ranges.
///
/// E.g., `[1, 2, 3, 7, 8, 12]` → `[(1, 3), (7, 8), (12, 12)]`
pub fn contiguous_ranges(pages: &[u32]) -> Vec<(u32, u32)> {
    let mut sorted: Vec<u32> = pages.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for p in sorted {
        match ranges.last_mut() {
            Some((_, end)) if p == *end + 1 => *end = p,
            _ => ranges.push((p, p)),
        }
    }
    ranges
}

/// pdftoppm zero-pads page numbers based on the document's page count.
pub fn find_rendered_page(dir: &Path, page_num: u32, total_pages: u32) -> Option<PathBuf> {
    let expected = total_pages.max(1).to_string().len().max(2);

    std::iter::once(expected)
        .chain(1..=6)
        .map(|width| dir.join(format!("page-{:0>width$}.jpg", page_num, width = width)))
        .find(|path| path.exists())
}
