//! Transforms applied between PDF input and EPUB output.

pub mod cover;
pub mod merge_metadata;

use convert_core::plugin::Transform;

/// The transform chain, in execution order:
///  1. MergeMetadata (always)
///  2. Cover         (conditional: includes_cover)
pub fn standard_transforms() -> Vec<Box<dyn Transform>> {
    vec![
        Box::new(merge_metadata::MergeMetadata),
        Box::new(cover::Cover),
    ]
}
