//! Table of contents from the PDF outline, or one entry per page.

use std::collections::BTreeMap;

use convert_core::book::{Toc, TocEntry};

use crate::pdftohtml::OutlineItem;

/// Outlines with fewer top-level entries than this are ignored.
pub const MIN_OUTLINE_ENTRIES: usize = 3;

/// Build the TOC. `page_hrefs` maps 1-based page numbers to content hrefs;
/// outline entries pointing at pages without content are skipped together
/// with their subtree.
pub fn build_toc(outline: &[OutlineItem], page_hrefs: &BTreeMap<u32, String>) -> Toc {
    let mut toc = Toc::new();

    if outline.len() >= MIN_OUTLINE_ENTRIES {
        for entry in outline_entries(outline, page_hrefs) {
            toc.add(entry);
        }
        if !toc.is_empty() {
            return toc;
        }
    }

    for (page, href) in page_hrefs {
        toc.add(TocEntry::new(format!("Page {}", page), href));
    }
    toc
}

fn outline_entries(items: &[OutlineItem], page_hrefs: &BTreeMap<u32, String>) -> Vec<TocEntry> {
    items
        .iter()
        .filter_map(|item| {
            let href = page_hrefs.get(&item.page)?;
            let title = if item.title.is_empty() {
                format!("Page {}", item.page)
            } else {
                item.title.clone()
            };
            let mut entry = TocEntry::new(title, href);
            for child in outline_entries(&item.children, page_hrefs) {
                entry.add_child(child);
            }
            Some(entry)
        })
        .collect()
}
