//! Per-source ingestion
//!
//! One call handles one source file from open to close: gate and clean every
//! line, apply the substring filters, and push accepted records to the
//! aggregator in batches. Problems with the source itself are reported and
//! returned as a [`SourceOutcome`]; they never fail the run.

use anyhow::Result;
use std::io::{self, Read};
use std::sync::Arc;

use crate::aggregate::AggregatorHandle;
use crate::config::{FilterConfig, FilterVerdict, SourceEntry};
use crate::diagnostics::{Diagnostic, Reporter};
use crate::normalize::{clean_line, passes_gate, record_from_cleaned, NormalizedRecord};
use crate::readers::SourceLineReader;
use crate::stats::ProcessingStats;

/// Upper bound for the initial batch allocation
const MAX_INITIAL_BATCH_CAPACITY: usize = 8 * 1024;

/// How a source ended
#[derive(Debug)]
pub enum SourceOutcome {
    /// Read to the end
    Ingested,
    /// Path does not exist or is not a regular file
    Missing,
    /// Open or read failed; records read before `line` were kept
    ReadFailed { line: usize, error: io::Error },
}

/// Result of ingesting one source
#[derive(Debug)]
pub struct SourceReport {
    pub label: String,
    pub outcome: SourceOutcome,
    pub stats: ProcessingStats,
}

/// Settings shared by every ingest worker
#[derive(Clone, Copy)]
pub struct IngestContext<'a> {
    pub filter: &'a FilterConfig,
    pub encoding: &'static encoding_rs::Encoding,
    pub batch_size: usize,
    pub reporter: &'a dyn Reporter,
}

/// Ingest a single source into the aggregator.
///
/// The file handle lives only inside this call and is closed on every path.
/// `Err` is returned only when the aggregator itself is gone.
pub fn ingest_source(
    entry: &SourceEntry,
    ctx: &IngestContext<'_>,
    sink: &AggregatorHandle,
) -> Result<SourceReport> {
    let mut stats = ProcessingStats::new();

    if !entry.path().is_file() {
        ctx.reporter.report(&Diagnostic::SourceUnavailable {
            label: entry.label().to_string(),
            path: entry.path().to_path_buf(),
        });
        stats.sources_missing = 1;
        return Ok(report(entry, SourceOutcome::Missing, stats));
    }

    let mut reader = match SourceLineReader::open(entry.path(), ctx.encoding) {
        Ok(reader) => reader,
        Err(error) => {
            return Ok(read_failed(entry, ctx, stats, 0, error));
        }
    };

    match ingest_lines(&mut reader, entry.label_arc(), ctx, sink, &mut stats)? {
        None => {
            stats.sources_ok = 1;
            Ok(report(entry, SourceOutcome::Ingested, stats))
        }
        Some(error) => {
            let line = reader.line_num();
            Ok(read_failed(entry, ctx, stats, line, error))
        }
    }
}

/// Stream lines from `reader` into `sink`.
///
/// Returns the I/O error that stopped reading, if any. Whatever was read
/// before that error has already been delivered.
pub fn ingest_lines<R: Read>(
    reader: &mut SourceLineReader<R>,
    label: &Arc<str>,
    ctx: &IngestContext<'_>,
    sink: &AggregatorHandle,
    stats: &mut ProcessingStats,
) -> Result<Option<io::Error>> {
    let batch_size = ctx.batch_size.max(1);
    let mut batch: Vec<NormalizedRecord> =
        Vec::with_capacity(batch_size.min(MAX_INITIAL_BATCH_CAPACITY));
    let mut raw = String::new();

    let failure = loop {
        match reader.read_line(&mut raw) {
            Ok(true) => {}
            Ok(false) => break None,
            Err(error) => break Some(error),
        }
        stats.lines_read += 1;

        if !passes_gate(&raw) {
            stats.lines_malformed += 1;
            continue;
        }

        let cleaned = clean_line(&raw);
        match ctx.filter.verdict(&cleaned) {
            FilterVerdict::Excluded => {
                stats.lines_excluded += 1;
                continue;
            }
            FilterVerdict::NotIncluded => {
                stats.lines_not_included += 1;
                continue;
            }
            FilterVerdict::Accept => {}
        }

        stats.lines_accepted += 1;
        batch.push(record_from_cleaned(cleaned, label));

        if batch.len() >= batch_size {
            let full = std::mem::replace(
                &mut batch,
                Vec::with_capacity(batch_size.min(MAX_INITIAL_BATCH_CAPACITY)),
            );
            sink.deliver(full)?;
        }
    };

    sink.deliver(batch)?;
    Ok(failure)
}

fn read_failed(
    entry: &SourceEntry,
    ctx: &IngestContext<'_>,
    mut stats: ProcessingStats,
    line: usize,
    error: io::Error,
) -> SourceReport {
    ctx.reporter.report(&Diagnostic::SourceReadFailed {
        label: entry.label().to_string(),
        path: entry.path().to_path_buf(),
        line,
        error: error.to_string(),
    });
    stats.sources_failed = 1;
    report(entry, SourceOutcome::ReadFailed { line, error }, stats)
}

fn report(entry: &SourceEntry, outcome: SourceOutcome, stats: ProcessingStats) -> SourceReport {
    SourceReport {
        label: entry.label().to_string(),
        outcome,
        stats,
    }
}
