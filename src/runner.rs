//! Merge execution
//!
//! A bounded pool of ingest workers pulls sources from a shared work queue
//! and feeds one aggregator. Joining the pool is the barrier: only after
//! every worker has returned is the record set sorted and written.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver};
use std::thread;
use std::time::Instant;

use crate::aggregate::{Aggregator, AggregatorHandle};
use crate::config::{MergeConfig, SourceEntry};
use crate::diagnostics::{Diagnostic, Reporter};
use crate::ingest::{ingest_source, IngestContext, SourceReport};
use crate::normalize::NormalizedRecord;
use crate::sort;
use crate::stats::ProcessingStats;
use crate::writer;

/// Records collected from all sources, after the barrier
#[derive(Debug)]
pub struct IngestResult {
    pub records: Vec<NormalizedRecord>,
    pub reports: Vec<SourceReport>,
    pub stats: ProcessingStats,
}

/// Result of a complete merge run
#[derive(Debug)]
pub struct MergeSummary {
    pub records_written: usize,
    pub reports: Vec<SourceReport>,
    pub stats: ProcessingStats,
}

/// Ingest every source, sort, and write the output file.
///
/// Only output failures are returned as errors; unavailable or unreadable
/// sources are reported and skipped.
pub fn run_merge(config: &MergeConfig, reporter: &dyn Reporter) -> Result<MergeSummary> {
    let run_start = Instant::now();

    let IngestResult {
        records,
        reports,
        mut stats,
    } = ingest_all(config, reporter)?;

    let sort_start = Instant::now();
    let records = sort::finalize(records, &config.filter);
    stats.sort_time = sort_start.elapsed();
    reporter.report(&Diagnostic::SortFinished {
        elapsed: stats.sort_time,
        records: records.len(),
    });

    let records_written =
        writer::write_output(&config.output.path, &records, config.output.write_bom)?;
    reporter.report(&Diagnostic::OutputWritten {
        path: config.output.path.clone(),
        records: records_written,
    });

    stats.total_time = run_start.elapsed();
    reporter.report(&Diagnostic::RunFinished {
        elapsed: stats.total_time,
    });

    Ok(MergeSummary {
        records_written,
        reports,
        stats,
    })
}

/// Run the ingest pool over all configured sources and wait for it.
///
/// Reports come back in configuration order whatever order the workers
/// finished in.
pub fn ingest_all(config: &MergeConfig, reporter: &dyn Reporter) -> Result<IngestResult> {
    let ingest_start = Instant::now();
    let sources = &config.input.sources;
    let workers = config.performance.effective_threads(sources.len());

    reporter.report(&Diagnostic::RunStarted {
        sources: sources.len(),
        workers,
    });

    let (work_sender, work_receiver) = unbounded();
    for (index, entry) in sources.iter().enumerate() {
        work_sender
            .send((index, entry))
            .map_err(|_| anyhow!("Work queue closed unexpectedly"))?;
    }
    drop(work_sender);

    let ctx = IngestContext {
        filter: &config.filter,
        encoding: config.input.encoding,
        batch_size: config.performance.effective_batch_size(),
        reporter,
    };

    let aggregator = Aggregator::new()?;

    let worker_results: Vec<Result<Vec<(usize, SourceReport)>>> = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let receiver = work_receiver.clone();
            let sink = aggregator.handle();
            let spawned = thread::Builder::new()
                .name(format!("logmerge-ingest-{}", worker_id))
                .spawn_scoped(scope, move || worker_thread(receiver, &ctx, sink));
            handles.push(spawned);
        }

        handles
            .into_iter()
            .map(|spawned| {
                spawned
                    .context("Failed to spawn ingest worker")?
                    .join()
                    .map_err(|_| anyhow!("Ingest worker panicked"))?
            })
            .collect()
    });

    let mut indexed = Vec::with_capacity(sources.len());
    for result in worker_results {
        indexed.extend(result?);
    }
    let records = aggregator.finish()?;

    indexed.sort_by_key(|(index, _)| *index);
    let reports: Vec<SourceReport> = indexed.into_iter().map(|(_, report)| report).collect();

    let mut stats = ProcessingStats::new();
    for report in &reports {
        stats.merge(&report.stats);
    }
    stats.ingest_time = ingest_start.elapsed();

    reporter.report(&Diagnostic::IngestFinished {
        elapsed: stats.ingest_time,
        records: records.len(),
    });

    Ok(IngestResult {
        records,
        reports,
        stats,
    })
}

/// Pull sources off the queue until it is empty
fn worker_thread(
    receiver: Receiver<(usize, &SourceEntry)>,
    ctx: &IngestContext<'_>,
    sink: AggregatorHandle,
) -> Result<Vec<(usize, SourceReport)>> {
    let mut reports = Vec::new();
    while let Ok((index, entry)) = receiver.recv() {
        reports.push((index, ingest_source(entry, ctx, &sink)?));
    }
    Ok(reports)
}
