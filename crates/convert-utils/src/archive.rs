//! ZIP container utilities for writing (and inspecting) EPUB files.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Read a single file from inside a ZIP archive.
pub fn read_zip_entry(zip_path: &Path, entry_name: &str) -> io::Result<Vec<u8>> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut entry = archive.by_name(entry_name)?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

/// List entry names in archive order.
pub fn list_zip_entries(zip_path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(zip_path)?;
    let archive = ZipArchive::new(file)?;
    let entries = (0..archive.len())
        .filter_map(|i| archive.name_for_index(i).map(|s| s.to_string()))
        .collect();
    Ok(entries)
}

/// Builder for creating ZIP archives (used for EPUB output).
pub struct ZipBuilder {
    writer: ZipWriter<File>,
}

impl ZipBuilder {
    /// Create (or truncate) the ZIP file at the given path.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: ZipWriter::new(file),
        })
    }

    /// Add a deflate-compressed entry.
    pub fn add_file(&mut self, name: &str, content: &[u8]) -> io::Result<()> {
        self.add(name, content, CompressionMethod::Deflated)
    }

    /// Add an entry stored without compression (the EPUB `mimetype`, JPEGs).
    pub fn add_stored(&mut self, name: &str, content: &[u8]) -> io::Result<()> {
        self.add(name, content, CompressionMethod::Stored)
    }

    pub fn finish(self) -> io::Result<()> {
        self.writer.finish()?;
        Ok(())
    }

    fn add(&mut self, name: &str, content: &[u8], method: CompressionMethod) -> io::Result<()> {
        let options = SimpleFileOptions::default().compression_method(method);
        self.writer.start_file(name, options)?;
        self.writer.write_all(content)?;
        Ok(())
    }
}
