//! Event classification and run-length aggregation.
//!
//! This module decides, per event record:
//! - Whether it represents a failure (keyword and structured-result checks)
//! - Whether it joins a run of low-information events collapsed into one node

pub mod classifier;
pub mod dedup;

// Re-export main types and functions
pub use classifier::{has_error_keyword, is_error, is_failed_invocation};
pub use dedup::{AggregateBucket, AggregateCache, BucketKey, DedupState, Deduplicator};
