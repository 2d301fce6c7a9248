//! Line gate and cleanup for date-prefixed records
//!
//! A raw line is admitted only when it starts with an eight digit date
//! followed by the field separator. Admitted lines lose every control
//! character and their surrounding whitespace, and are tagged with the label
//! of the source that produced them.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// Field separator for both input and output lines
pub const SEPARATOR: char = ';';

const DATE_LEN: usize = 8;

/// A cleaned line that passed the format gate, tagged with its source label.
///
/// The date is always the first eight bytes of the cleaned line and the time
/// is the second `;`-delimited field, so both are stored as offsets into the
/// line instead of separate allocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    line: String,
    time_end: usize,
    label: Arc<str>,
}

impl NormalizedRecord {
    /// The eight digit date prefix
    pub fn date_part(&self) -> &str {
        &self.line[..DATE_LEN]
    }

    /// Second field of the cleaned line (may be empty)
    pub fn time_part(&self) -> &str {
        &self.line[DATE_LEN + 1..self.time_end]
    }

    /// Everything after the time field, without its leading separator
    pub fn remainder(&self) -> &str {
        self.line.get(self.time_end + 1..).unwrap_or("")
    }

    /// The full cleaned line, without the label
    pub fn cleaned_line(&self) -> &str {
        &self.line
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Composite ordering key: `(date, time)` compared as strings
    pub fn sort_key(&self) -> (&str, &str) {
        (self.date_part(), self.time_part())
    }

    /// Serialized form, `cleaned;label`
    pub fn output_line(&self) -> String {
        self.to_string()
    }

    /// Write the serialized form followed by a newline
    pub fn write_line<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(self.line.as_bytes())?;
        out.write_all(b";")?;
        out.write_all(self.label.as_bytes())?;
        out.write_all(b"\n")
    }
}

impl fmt::Display for NormalizedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.line, SEPARATOR, self.label)
    }
}

/// Format gate, evaluated on the raw line before any cleanup.
///
/// Digits and the separator are ASCII, so checking the first nine bytes is
/// equivalent to checking the first nine characters.
pub fn passes_gate(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() > DATE_LEN
        && bytes[DATE_LEN] == SEPARATOR as u8
        && bytes[..DATE_LEN].iter().all(u8::is_ascii_digit)
}

/// Remove every Unicode control character, then trim surrounding whitespace.
pub fn clean_line(raw: &str) -> String {
    if !raw.chars().any(char::is_control) {
        return raw.trim().to_string();
    }

    let stripped: String = raw.chars().filter(|c| !c.is_control()).collect();
    let trimmed = stripped.trim();
    if trimmed.len() == stripped.len() {
        stripped
    } else {
        trimmed.to_string()
    }
}

/// Gate and clean one raw line. `None` means the line is rejected.
pub fn normalize_line(raw: &str, label: &Arc<str>) -> Option<NormalizedRecord> {
    if !passes_gate(raw) {
        return None;
    }
    Some(record_from_cleaned(clean_line(raw), label))
}

/// Build a record from a line that already passed the gate and cleanup.
///
/// Neither step can touch the `dddddddd;` prefix: digits and the separator
/// are neither control characters nor whitespace.
pub(crate) fn record_from_cleaned(line: String, label: &Arc<str>) -> NormalizedRecord {
    let time_start = DATE_LEN + 1;
    let time_end = line[time_start..]
        .find(SEPARATOR)
        .map_or(line.len(), |pos| time_start + pos);

    NormalizedRecord {
        line,
        time_end,
        label: Arc::clone(label),
    }
}

/// Fold a string for case-insensitive substring matching.
///
/// Every character is mapped on its own to its simple uppercase form, so
/// matching compares one character at a time with no context rules: a
/// word-final `Σ` folds the same as a standalone one, `ß` stays `ß`, and
/// the Kelvin sign does not fold to `K`. ASCII input takes the cheap path,
/// which gives the same result.
pub fn fold_case(input: &str) -> String {
    if input.is_ascii() {
        input.to_ascii_uppercase()
    } else {
        input.chars().map(fold_char).collect()
    }
}

/// Simple one-to-one uppercase mapping; characters whose uppercase form is
/// longer than one character are left alone.
fn fold_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}
