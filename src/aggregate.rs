//! Fan-in sink for normalized records
//!
//! Every ingest worker holds an [`AggregatorHandle`] and sends whole batches
//! into one channel. A single collector thread drains the channel into a
//! growable buffer. [`Aggregator::finish`] closes the channel and joins the
//! collector, so the returned buffer is complete and no producer can touch
//! it any more.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::normalize::NormalizedRecord;

type RecordBatch = Vec<NormalizedRecord>;

/// Owner of the collector thread
pub struct Aggregator {
    sender: Sender<RecordBatch>,
    collector: JoinHandle<RecordBatch>,
}

/// Producer side; cheap to clone, safe to use from any thread
#[derive(Clone)]
pub struct AggregatorHandle {
    sender: Sender<RecordBatch>,
}

impl Aggregator {
    pub fn new() -> Result<Self> {
        let (sender, receiver) = unbounded();
        let collector = thread::Builder::new()
            .name("logmerge-aggregator".to_string())
            .spawn(move || collector_thread(receiver))
            .context("Failed to spawn aggregator thread")?;

        Ok(Self { sender, collector })
    }

    pub fn handle(&self) -> AggregatorHandle {
        AggregatorHandle {
            sender: self.sender.clone(),
        }
    }

    /// Wait for every handle to be dropped and return all delivered records.
    pub fn finish(self) -> Result<Vec<NormalizedRecord>> {
        drop(self.sender);
        self.collector
            .join()
            .map_err(|_| anyhow!("Aggregator thread panicked"))
    }
}

impl AggregatorHandle {
    /// Hand a batch over to the collector; empty batches are not sent.
    pub fn deliver(&self, batch: RecordBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.sender
            .send(batch)
            .map_err(|_| anyhow!("Aggregator closed before ingestion finished"))
    }
}

fn collector_thread(receiver: Receiver<RecordBatch>) -> RecordBatch {
    let mut records = Vec::new();
    // recv fails only once every sender is gone
    while let Ok(mut batch) = receiver.recv() {
        if records.is_empty() {
            records = batch;
        } else {
            records.append(&mut batch);
        }
    }
    records
}
