//! # huddle
//!
//! Groups large volumes of short text records into clusters of
//! near-duplicates. Each record is fingerprinted into a 256-bit
//! similarity-preserving code; a binary trie over the codes answers
//! bounded-Hamming-distance neighbor lookups; and a concurrent
//! reader/worker/aggregator pipeline assigns every record a group id,
//! minting fresh ids only for codes with no close-enough neighbor.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use huddle::{group_records, PipelineConfig};
//! use huddle::io::open_records;
//!
//! let reader = open_records("tweets.txt").unwrap();
//! let outcome = group_records(reader, PipelineConfig::default()).unwrap();
//! println!(
//!     "With {} degrees of deviance, {} entries were grouped into {} unique groups",
//!     outcome.stats.deviance, outcome.stats.total, outcome.stats.groups
//! );
//! ```

pub mod error;
pub mod idgen;
pub mod io;
pub mod pipeline;

pub use error::{HuddleError, Result};
pub use idgen::{IdAllocator, IdSource};
pub use io::{open_records, read_grouped_jsonl, write_grouped_jsonl};
pub use pipeline::{
    group_records, GroupStats, GroupedRecord, GroupingOutcome, GroupingPipeline, PipelineConfig,
    DEFAULT_DEVIANCE,
};

pub use huddle_core::fingerprint::{fingerprint, Fingerprint, FINGERPRINT_BITS};
pub use huddle_core::trie::{FingerprintTrie, GroupId};
