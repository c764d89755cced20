//! User-facing error formatting for the command line front end.

use std::io;
use std::path::Path;

use crate::BenchError;

/// Format a user friendly I/O error message with suggestions.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    use io::ErrorKind::*;
    let suggestion = match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        UnexpectedEof => "File appears truncated or corrupted.",
        WriteZero => "Disk may be full. Free up space and try again.",
        Other if err.raw_os_error() == Some(28) => "Disk may be full. Free up space and try again.",
        _ => "Check permissions or free up disk space.",
    };
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        suggestion
    )
}

/// Convert an I/O error into a std::io::Error with context.
pub fn io_error(operation: &str, path: &Path, err: io::Error) -> io::Error {
    io::Error::new(err.kind(), format_io_error(operation, path, &err))
}

/// Return an actionable hint for a benchmark error variant.
pub fn cli_hint(err: &BenchError) -> String {
    use BenchError::*;
    match err {
        InvalidInput(msg) => format!("{msg}. Check the input file."),
        Tool(msg) => format!("{msg}. Check that the tool is installed and the archive is intact."),
        Io(io) => format!("{io}"),
    }
}
