//! Concurrent grouping pipeline.
//!
//! A single reader task feeds raw records into a bounded channel; a fixed
//! pool of workers fingerprints each record, resolves its group against
//! the shared trie and tags it; an aggregator collects tagged records
//! until every worker has finished. All coordination is message-passing
//! except the trie itself, which sits behind a reader/writer lock: lookups
//! run under shared access, and only the insert-or-confirm step takes the
//! exclusive permit.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use huddle::pipeline::{GroupingPipeline, PipelineConfig};
//! use std::io::Cursor;
//!
//! let pipeline = GroupingPipeline::new(PipelineConfig::default()).unwrap();
//! let outcome = pipeline.run(Cursor::new(b"one\ntwo\none\n".to_vec())).unwrap();
//! println!("{} records in {} groups", outcome.stats.total, outcome.stats.groups);
//! ```

use crate::error::{HuddleError, Result};
use crate::idgen::{IdAllocator, IdSource};
use crossbeam_channel::{bounded, Receiver, Sender};
use huddle_core::fingerprint::{fingerprint, FINGERPRINT_BITS};
use huddle_core::trie::{FingerprintTrie, GroupId};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::sync::RwLock;
use std::thread;
use std::time::Instant;

/// Default bit-mismatch budget ("degrees of deviance").
pub const DEFAULT_DEVIANCE: u32 = 40;

/// Configuration for a grouping run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of fingerprint bits allowed to differ within a group.
    pub deviance: u32,
    /// Number of worker threads.
    pub workers: usize,
    /// Capacity of the record and output channels.
    pub queue_capacity: usize,
    /// Emit a progress line every this many grouped records.
    pub report_interval: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deviance: DEFAULT_DEVIANCE,
            workers: default_workers(),
            queue_capacity: 1024,
            report_interval: usize::MAX,
        }
    }
}

impl PipelineConfig {
    /// Set the deviance budget.
    #[must_use]
    pub fn with_deviance(mut self, deviance: u32) -> Self {
        self.deviance = deviance;
        self
    }

    /// Set the worker count.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

fn default_workers() -> usize {
    thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

/// A record tagged with its group id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedRecord {
    /// Assigned group id.
    pub group: GroupId,
    /// Record text, without its trailing delimiter.
    pub text: String,
}

/// Statistics from a grouping run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupStats {
    /// Total records processed.
    pub total: usize,
    /// Number of distinct groups (unique trie leaves).
    pub groups: usize,
    /// Records that joined an existing group.
    pub duplicates: usize,
    /// Deviance budget the run was configured with.
    pub deviance: u32,
    /// One past the last group id issued.
    pub ids_issued: GroupId,
    /// Processing time in seconds.
    pub elapsed_secs: f64,
}

impl GroupStats {
    /// Throughput in records per second.
    #[must_use]
    pub fn throughput(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.total as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }
}

/// Everything a grouping run produces.
#[derive(Debug)]
pub struct GroupingOutcome {
    /// Every input record with its assigned group id, in aggregation order.
    pub records: Vec<GroupedRecord>,
    /// Aggregate statistics.
    pub stats: GroupStats,
}

/// One-shot grouping pipeline over a record stream.
///
/// The trie index lives for the duration of a single run and is discarded
/// with the pipeline; group ids are only meaningful within that run.
pub struct GroupingPipeline {
    config: PipelineConfig,
    trie: RwLock<FingerprintTrie>,
}

impl GroupingPipeline {
    /// Create a pipeline, validating the configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(HuddleError::Config("worker count must be positive".into()));
        }
        if config.deviance as usize > FINGERPRINT_BITS {
            return Err(HuddleError::Config(format!(
                "deviance must be at most {FINGERPRINT_BITS}"
            )));
        }
        if config.queue_capacity == 0 {
            return Err(HuddleError::Config("queue capacity must be positive".into()));
        }
        Ok(Self {
            config,
            trie: RwLock::new(FingerprintTrie::new()),
        })
    }

    /// The configuration this pipeline was built with.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Group every record in `input` (one record per line).
    ///
    /// Trailing `\n`/`\r\n` delimiters are stripped before fingerprinting.
    /// Records shorter than the fingerprint window are still grouped (they
    /// all share the degenerate code); a bad record never aborts the run.
    pub fn run<R>(self, input: R) -> Result<GroupingOutcome>
    where
        R: BufRead + Send,
    {
        let start = Instant::now();
        let allocator = IdAllocator::spawn();

        let (record_tx, record_rx) = bounded::<Vec<u8>>(self.config.queue_capacity);
        let (out_tx, out_rx) = bounded::<GroupedRecord>(self.config.queue_capacity);

        let (records, reader_result, worker_results) = thread::scope(|scope| {
            let reader = scope.spawn(move || read_records(input, record_tx));

            let mut workers = Vec::with_capacity(self.config.workers);
            for _ in 0..self.config.workers {
                let records = record_rx.clone();
                let out = out_tx.clone();
                let ids = allocator.source();
                let trie = &self.trie;
                let deviance = self.config.deviance;
                workers.push(scope.spawn(move || worker_loop(records, out, trie, ids, deviance)));
            }
            drop(record_rx);
            // Each worker owns a sender clone; dropping ours here means the
            // aggregation loop below ends exactly when the last worker
            // finishes, never before.
            drop(out_tx);

            let mut records = Vec::new();
            for record in out_rx.iter() {
                records.push(record);
                if records.len() % self.config.report_interval == 0 {
                    eprintln!(
                        "Grouped {} records - {:.0} records/sec",
                        records.len(),
                        records.len() as f64 / start.elapsed().as_secs_f64()
                    );
                }
            }

            let reader_result = reader.join();
            let worker_results: Vec<_> = workers.into_iter().map(|w| w.join()).collect();
            (records, reader_result, worker_results)
        });

        let ids_issued = allocator.shutdown()?;

        for result in worker_results {
            result.map_err(|_| HuddleError::Pipeline("worker thread panicked".into()))??;
        }
        reader_result.map_err(|_| HuddleError::Pipeline("reader thread panicked".into()))??;

        let trie = self
            .trie
            .into_inner()
            .map_err(|_| HuddleError::Pipeline("fingerprint index lock poisoned".into()))?;
        let groups = trie.leaf_count(false);

        let stats = GroupStats {
            total: records.len(),
            groups,
            duplicates: records.len() - groups,
            deviance: self.config.deviance,
            ids_issued,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };

        Ok(GroupingOutcome { records, stats })
    }
}

/// Group records with the given configuration.
///
/// Convenience wrapper for simple use cases.
pub fn group_records<R>(input: R, config: PipelineConfig) -> Result<GroupingOutcome>
where
    R: BufRead + Send,
{
    GroupingPipeline::new(config)?.run(input)
}

/// Reader task: split the stream into records and feed the worker queue.
fn read_records<R: BufRead>(mut input: R, records: Sender<Vec<u8>>) -> Result<()> {
    loop {
        let mut record = Vec::new();
        let n = input.read_until(b'\n', &mut record)?;
        if n == 0 {
            return Ok(());
        }
        if record.last() == Some(&b'\n') {
            record.pop();
        }
        if record.last() == Some(&b'\r') {
            record.pop();
        }
        if records.send(record).is_err() {
            // All workers are gone; their join results carry the cause.
            return Ok(());
        }
    }
}

/// Worker task: fingerprint, resolve the group, emit the tagged record.
fn worker_loop(
    records: Receiver<Vec<u8>>,
    out: Sender<GroupedRecord>,
    trie: &RwLock<FingerprintTrie>,
    ids: IdSource,
    deviance: u32,
) -> Result<()> {
    for record in records.iter() {
        let code = fingerprint(&record);

        // Optimistic pass under shared access.
        let found = trie
            .read()
            .map_err(|_| HuddleError::Pipeline("fingerprint index lock poisoned".into()))?
            .nearest_group(&code, deviance);

        let group = match found {
            Some(group) => group,
            None => {
                let mut index = trie
                    .write()
                    .map_err(|_| HuddleError::Pipeline("fingerprint index lock poisoned".into()))?;
                // Re-check under the write permit: another worker may have
                // inserted a matching neighborhood since the optimistic
                // search. Only mint an id if the miss still stands.
                match index.nearest_group(&code, deviance) {
                    Some(group) => group,
                    None => {
                        let group = ids.next_id()?;
                        index.insert(&code, group);
                        group
                    }
                }
            }
        };

        let tagged = GroupedRecord {
            group,
            text: String::from_utf8_lossy(&record).into_owned(),
        };
        out.send(tagged)
            .map_err(|_| HuddleError::Pipeline("output channel closed".into()))?;
    }
    Ok(())
}
