use anyhow::{anyhow, Context, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::normalize::NormalizedRecord;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write `records` to `path` as UTF-8, one `cleaned;label` line each,
/// replacing any existing file.
///
/// On failure the partially written file is removed so that no truncated
/// output is left behind.
pub fn write_output(path: &Path, records: &[NormalizedRecord], write_bom: bool) -> Result<usize> {
    let file = File::create(path).map_err(|e| anyhow!("{}", create_helpful_error_message(path, &e)))?;

    match write_records(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file), records, write_bom) {
        Ok(()) => Ok(records.len()),
        Err(e) => {
            let _ = fs::remove_file(path);
            Err(e).with_context(|| format!("Output file write failed '{}'", path.display()))
        }
    }
}

/// Serialize records into any writer
pub fn write_records<W: Write>(mut out: W, records: &[NormalizedRecord], write_bom: bool) -> io::Result<()> {
    if write_bom {
        out.write_all(UTF8_BOM)?;
    }
    for record in records {
        record.write_line(&mut out)?;
    }
    out.flush()
}

/// Create a helpful error message for file creation failures
fn create_helpful_error_message(path: &Path, error: &io::Error) -> String {
    let base_msg = format!("Cannot create output file '{}': {}", path.display(), error);

    let suggestion = match error.kind() {
        io::ErrorKind::PermissionDenied => {
            if path.parent().is_some_and(|p| !p.as_os_str().is_empty() && !p.exists()) {
                "Suggestion: Parent directory does not exist, create it first"
            } else {
                "Suggestion: Check file permissions or choose a writable location"
            }
        }
        io::ErrorKind::NotFound => "Suggestion: Parent directory does not exist, create it first",
        _ if path.is_dir() => "Suggestion: Path points to a directory, specify a filename instead",
        io::ErrorKind::InvalidInput => "Suggestion: Check for invalid characters in filename",
        _ => return base_msg,
    };

    format!("{}\n{}", base_msg, suggestion)
}
