//! Types for the batch-get-traces exchange with an HTTP trace gateway.

use serde::{Deserialize, Serialize};

/// Batch lookup request
#[derive(Debug, Clone, Serialize)]
pub struct BatchGetTracesRequest {
    #[serde(rename = "TraceIds")]
    pub trace_ids: Vec<String>,
    #[serde(rename = "Region")]
    pub region: String,
}

impl BatchGetTracesRequest {
    /// Request for a single trace
    pub fn single(trace_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            trace_ids: vec![trace_id.into()],
            region: region.into(),
        }
    }
}

/// Batch lookup response
#[derive(Debug, Deserialize)]
pub struct BatchGetTracesResponse {
    #[serde(rename = "Traces", default)]
    pub traces: Vec<TraceRecord>,
    #[serde(rename = "UnprocessedTraceIds", default)]
    pub unprocessed_trace_ids: Vec<String>,
}

/// One trace of the response
#[derive(Debug, Deserialize)]
pub struct TraceRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Segments", default)]
    pub segments: Vec<SegmentDocument>,
}

/// One segment, its body encoded as a JSON string
///
/// The document is decoded later so one bad segment does not sink the batch.
#[derive(Debug, Deserialize)]
pub struct SegmentDocument {
    #[serde(rename = "Id", default)]
    pub id: String,
    #[serde(rename = "Document")]
    pub document: String,
}
