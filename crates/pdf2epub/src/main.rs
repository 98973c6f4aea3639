//! pdf2epub: convert a PDF to EPUB from one JSON argument.
//!
//! ```text
//! pdf2epub '{"pdf_path": "in.pdf", "epub_path": "out.epub", "title": "T", "author": "A"}'
//! ```
//!
//! Prints `{"success": true}` on stdout and exits 0, or a failure verdict
//! and exits 1. Diagnostics are off unless `RUST_LOG` is set.

use std::io;
use std::process;

fn main() {
    // stdout and stderr carry the verdict; logging is opt-in.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let code = pdf2epub::cli::run(
        std::env::args_os(),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    );
    process::exit(code);
}
