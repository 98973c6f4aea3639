//! Core types for the PDF → EPUB conversion pipeline: the book IR,
//! conversion options, errors, plugin traits, and the pipeline runner.

pub mod book;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod plugin;
