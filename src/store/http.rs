//! HTTP client for a trace gateway speaking the batch-get-traces shape.

use super::types::{BatchGetTracesRequest, BatchGetTracesResponse};
use super::TraceStore;
use crate::parser::TraceSegment;
use crate::utils::config::DEFAULT_TRACE_TIMEOUT;
use crate::utils::error::TraceStoreError;
use log::{debug, info, warn};
use reqwest::blocking::Client;

/// Trace store backed by an HTTP endpoint
pub struct HttpTraceStore {
    client: Client,
    endpoint: String,
}

impl HttpTraceStore {
    /// Create a new trace store client
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TraceStoreError> {
        let client = Client::builder()
            .timeout(DEFAULT_TRACE_TIMEOUT)
            .build()
            .map_err(TraceStoreError::RequestFailed)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl TraceStore for HttpTraceStore {
    fn batch(&self, trace_id: &str, region: &str) -> Result<Vec<TraceSegment>, TraceStoreError> {
        info!("Fetching trace batch: {}", trace_id);

        let request = BatchGetTracesRequest::single(trace_id, region);
        debug!("Trace request: {:?}", request);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(TraceStoreError::RequestFailed)?;

        // Check HTTP status
        if !response.status().is_success() {
            return Err(TraceStoreError::InvalidResponse(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().unwrap_or_default()
            )));
        }

        let body: BatchGetTracesResponse = response.json().map_err(TraceStoreError::RequestFailed)?;
        extract_segments(body, trace_id)
    }
}

/// Decode the segment documents of `trace_id` from a batch response
fn extract_segments(
    body: BatchGetTracesResponse,
    trace_id: &str,
) -> Result<Vec<TraceSegment>, TraceStoreError> {
    let trace = body
        .traces
        .into_iter()
        .find(|t| t.id == trace_id)
        .ok_or_else(|| TraceStoreError::TraceNotFound(trace_id.to_string()))?;

    let segments: Vec<TraceSegment> = trace
        .segments
        .iter()
        .filter_map(|segment| match serde_json::from_str(&segment.document) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping undecodable segment {}: {}", segment.id, e);
                None
            }
        })
        .collect();

    if segments.is_empty() && !trace.segments.is_empty() {
        return Err(TraceStoreError::InvalidResponse(format!(
            "No decodable segments in trace {}",
            trace_id
        )));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> BatchGetTracesResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_segments() {
        let body = response(
            r#"{"Traces": [{"Id": "1-a", "Segments": [
                {"Id": "s1", "Document": "{\"id\": \"s1\", \"name\": \"fn\"}"},
                {"Id": "s2", "Document": "not json"}
            ]}]}"#,
        );
        let segments = extract_segments(body, "1-a").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].name, "fn");
    }

    #[test]
    fn test_missing_trace() {
        let body = response(r#"{"Traces": [], "UnprocessedTraceIds": ["1-a"]}"#);
        assert!(matches!(
            extract_segments(body, "1-a"),
            Err(TraceStoreError::TraceNotFound(_))
        ));
    }
}
