//! Book document intermediate representation.
//!
//! Every conversion passes through this IR:
//! PDF input plugin → BookDocument → transforms → EPUB output plugin.

use std::collections::HashMap;

/// The central intermediate representation for an ebook.
#[derive(Debug, Clone, Default)]
pub struct BookDocument {
    /// Dublin Core metadata
    pub metadata: Metadata,
    /// All content items (XHTML, CSS, images)
    pub manifest: Manifest,
    /// Reading order of content documents
    pub spine: Spine,
    /// Hierarchical table of contents
    pub toc: Toc,
    /// Standard section references (cover, text start)
    pub guide: Guide,
    /// Unique book identifier
    pub uid: Option<String>,
}

impl BookDocument {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Dublin Core metadata carried into the OPF package document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    title: Option<String>,
    authors: Vec<String>,
    language: Option<String>,
    description: Option<String>,
    /// Manifest id of the cover image, if one was produced.
    cover_image: Option<String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the title. Blank titles are ignored.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let t = title.into();
        let trimmed = t.trim();
        if !trimmed.is_empty() {
            self.title = Some(trimmed.to_string());
        }
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    /// Append an author. Blank names are ignored.
    pub fn add_author(&mut self, author: impl Into<String>) {
        let a = author.into();
        let trimmed = a.trim();
        if !trimmed.is_empty() {
            self.authors.push(trimmed.to_string());
        }
    }

    /// Replace the author list wholesale.
    pub fn set_authors(&mut self, authors: &[String]) {
        self.authors.clear();
        for author in authors {
            self.add_author(author.as_str());
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = Some(language.into());
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.cover_image.as_deref()
    }

    pub fn set_cover_image(&mut self, manifest_id: impl Into<String>) {
        self.cover_image = Some(manifest_id.into());
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Collection of all content items in the book, indexed by id and by href.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    items: Vec<ManifestItem>,
    id_index: HashMap<String, usize>,
    href_index: HashMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a manifest item. Returns the index.
    pub fn add(&mut self, item: ManifestItem) -> usize {
        let idx = self.items.len();
        self.id_index.insert(item.id.clone(), idx);
        self.href_index.insert(item.href.clone(), idx);
        self.items.push(item);
        idx
    }

    pub fn by_id(&self, id: &str) -> Option<&ManifestItem> {
        self.id_index.get(id).map(|&idx| &self.items[idx])
    }

    pub fn by_href(&self, href: &str) -> Option<&ManifestItem> {
        self.href_index.get(href).map(|&idx| &self.items[idx])
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pick an id starting with `base` that is not taken yet.
    pub fn unique_id(&self, base: &str) -> String {
        if !self.id_index.contains_key(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{}{}", base, i))
            .find(|id| !self.id_index.contains_key(id))
            .unwrap_or_else(|| base.to_string())
    }

    /// Pick an href `base.ext` (or `base_N.ext`) that is not taken yet.
    pub fn unique_href(&self, base: &str, ext: &str) -> String {
        let candidate = format!("{}.{}", base, ext);
        if !self.href_index.contains_key(&candidate) {
            return candidate;
        }
        (1..)
            .map(|i| format!("{}_{}.{}", base, i, ext))
            .find(|href| !self.href_index.contains_key(href))
            .unwrap_or(candidate)
    }
}

/// A single item in the manifest.
#[derive(Debug, Clone)]
pub struct ManifestItem {
    pub id: String,
    /// Path relative to the OPF document
    pub href: String,
    pub media_type: String,
    pub data: ManifestData,
}

impl ManifestItem {
    pub fn new(
        id: impl Into<String>,
        href: impl Into<String>,
        media_type: impl Into<String>,
        data: ManifestData,
    ) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            data,
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Content data for a manifest item.
#[derive(Debug, Clone)]
pub enum ManifestData {
    Xhtml(String),
    Css(String),
    /// Images and other binary resources
    Binary(Vec<u8>),
}

impl ManifestData {
    pub fn as_xhtml(&self) -> Option<&str> {
        match self {
            ManifestData::Xhtml(s) => Some(s),
            _ => None,
        }
    }

    /// Raw bytes as they will be stored in the container.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ManifestData::Xhtml(s) | ManifestData::Css(s) => s.as_bytes(),
            ManifestData::Binary(b) => b,
        }
    }
}

// ---------------------------------------------------------------------------
// Spine
// ---------------------------------------------------------------------------

/// Ordered reading sequence of content documents.
#[derive(Debug, Clone, Default)]
pub struct Spine {
    items: Vec<SpineItem>,
}

#[derive(Debug, Clone)]
pub struct SpineItem {
    /// ID referencing a manifest item
    pub idref: String,
    /// Whether this item is part of the linear reading order
    pub linear: bool,
}

impl Spine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, idref: impl Into<String>, linear: bool) {
        self.items.push(SpineItem {
            idref: idref.into(),
            linear,
        });
    }

    pub fn insert(&mut self, index: usize, idref: impl Into<String>, linear: bool) {
        self.items.insert(
            index,
            SpineItem {
                idref: idref.into(),
                linear,
            },
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpineItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[SpineItem] {
        &self.items
    }
}

// ---------------------------------------------------------------------------
// Table of Contents
// ---------------------------------------------------------------------------

/// Hierarchical navigation tree.
#[derive(Debug, Clone, Default)]
pub struct Toc {
    pub entries: Vec<TocEntry>,
}

impl Toc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: TocEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Depth of the deepest branch (0 for an empty TOC).
    pub fn depth(&self) -> usize {
        fn branch_depth(entry: &TocEntry) -> usize {
            1 + entry.children.iter().map(branch_depth).max().unwrap_or(0)
        }
        self.entries.iter().map(branch_depth).max().unwrap_or(0)
    }

    /// Total number of entries at all levels.
    pub fn count(&self) -> usize {
        fn branch_count(entry: &TocEntry) -> usize {
            1 + entry.children.iter().map(branch_count).sum::<usize>()
        }
        self.entries.iter().map(branch_count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub href: String,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: TocEntry) {
        self.children.push(child);
    }
}

// ---------------------------------------------------------------------------
// Guide
// ---------------------------------------------------------------------------

/// Standard section references, one per reference type.
#[derive(Debug, Clone, Default)]
pub struct Guide {
    refs: Vec<GuideRef>,
}

impl Guide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reference, replacing any existing one of the same type.
    pub fn add(&mut self, reference: GuideRef) {
        self.refs.retain(|r| r.ref_type != reference.ref_type);
        self.refs.push(reference);
    }

    pub fn get(&self, ref_type: &str) -> Option<&GuideRef> {
        self.refs.iter().find(|r| r.ref_type == ref_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GuideRef> {
        self.refs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct GuideRef {
    pub ref_type: String,
    pub title: String,
    pub href: String,
}

impl GuideRef {
    pub fn new(
        ref_type: impl Into<String>,
        title: impl Into<String>,
        href: impl Into<String>,
    ) -> Self {
        Self {
            ref_type: ref_type.into(),
            title: title.into(),
            href: href.into(),
        }
    }
}
