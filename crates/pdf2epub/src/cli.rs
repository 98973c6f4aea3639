//! Command-line entry: one JSON argument in, one JSON verdict out.

use std::ffi::OsString;
use std::io::Write;

use clap::Parser;

use crate::convert;
use crate::error::{AdapterError, Stream};
use crate::policy;
use crate::request::ConversionRequest;
use crate::response::ConversionResult;

#[derive(Parser, Debug)]
#[command(
    name = "pdf2epub",
    about = "Convert a PDF to EPUB from a JSON request",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// JSON object with `pdf_path`, `epub_path` and optional `title`, `author`
    #[arg(allow_hyphen_values = true)]
    request: Option<OsString>,

    /// Extra arguments are accepted and ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    rest: Vec<OsString>,
}

/// Run the adapter on `args` (including the program name), writing the
/// verdict to `out` or `err`. Returns the process exit code.
pub fn run<I, T>(args: I, out: &mut impl Write, err: &mut impl Write) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

    match execute(&args) {
        Ok(()) => {
            report(out, &ConversionResult::ok());
            0
        }
        Err(e) => {
            log::info!("Conversion failed: {}", e);
            let verdict = ConversionResult::failure(e.to_string());
            match e.stream() {
                Stream::Stdout => report(out, &verdict),
                Stream::Stderr => report(err, &verdict),
            }
            e.exit_code()
        }
    }
}

fn execute(args: &[OsString]) -> Result<(), AdapterError> {
    let raw = request_argument(args)?;
    let request = ConversionRequest::parse(&raw)?;
    log::debug!("Request: {:?}", request);

    convert::transform_epub(
        &request.pdf_path,
        &request.epub_path,
        request.book_meta(),
        &policy::conversion_options(),
    )?;
    Ok(())
}

/// argv[1] is the request, whatever it looks like. clap only accounts for
/// the trailing arguments, which are ignored.
fn request_argument(args: &[OsString]) -> Result<OsString, AdapterError> {
    let Some(raw) = args.get(1) else {
        return Err(AdapterError::MissingArgument);
    };

    match Cli::try_parse_from(args) {
        Ok(cli) => {
            if cli.request.as_deref() != Some(raw.as_os_str()) {
                log::debug!("Parser disagrees on the request; using argv[1] as is");
            }
            if !cli.rest.is_empty() {
                log::debug!("Ignoring {} extra argument(s)", cli.rest.len());
            }
        }
        Err(e) => log::debug!("Ignoring unparsed arguments: {}", e.kind()),
    }

    Ok(raw.clone())
}

fn report(stream: &mut impl Write, verdict: &ConversionResult) {
    if let Err(e) = verdict.write_line(stream) {
        log::warn!("Cannot write verdict: {}", e);
    }
}
