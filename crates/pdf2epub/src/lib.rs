//! JSON-in, JSON-out adapter around the PDF → EPUB pipeline.

pub mod cli;
pub mod convert;
pub mod error;
pub mod policy;
pub mod request;
pub mod response;
