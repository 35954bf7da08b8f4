//! Trace batch lookup.
//!
//! The distributed-trace store is an external collaborator. The assembler
//! only sees the `TraceStore` trait; the bundle directory and an HTTP
//! gateway are the two ways of backing it.

pub mod file;
pub mod http;
pub mod types;

use crate::parser::TraceSegment;
use crate::utils::error::TraceStoreError;

pub use file::FileTraceStore;
pub use http::HttpTraceStore;

/// Source of trace segment batches
pub trait TraceStore {
    /// Root segments of the batch recorded under `trace_id`
    fn batch(&self, trace_id: &str, region: &str) -> Result<Vec<TraceSegment>, TraceStoreError>;
}

/// Store with no traces; every lookup misses
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTraceStore;

impl TraceStore for NoTraceStore {
    fn batch(&self, trace_id: &str, _region: &str) -> Result<Vec<TraceSegment>, TraceStoreError> {
        Err(TraceStoreError::TraceNotFound(trace_id.to_string()))
    }
}
