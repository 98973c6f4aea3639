//! Shared helpers: XML/XHTML writing and ZIP container I/O.

pub mod archive;
pub mod xml;
