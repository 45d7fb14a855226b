//! # huddle-core
//!
//! Core primitives for grouping near-duplicate text records:
//!
//! - Similarity-preserving 256-bit fingerprints ([`fingerprint`])
//! - A binary trie over fingerprint codes with bounded-Hamming-distance
//!   neighbor lookup ([`trie`])
//!
//! This crate is purely algorithmic: no I/O, no threads. The concurrent
//! grouping pipeline and the CLI live in the `huddle` crate.

pub mod fingerprint;
pub mod trie;

pub use fingerprint::{fingerprint, Fingerprint, FINGERPRINT_BITS, FINGERPRINT_BYTES};
pub use trie::{FingerprintTrie, GroupId, TrieNode};
