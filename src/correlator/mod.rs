//! Cross-source correlation.
//!
//! Matches external-invocation events to the invocation logs and trace
//! batches describing the same call, and turns a match into a summary node
//! plus a trace artifact.

pub mod matcher;
pub mod trace_graph;

// Re-export main types and functions
pub use matcher::{correlate, function_name_from_arn, normalize_payload, TraceMatch};
pub use trace_graph::{
    build_trace_graph, flatten_segments, log_entry_text, problem_counts, resolve_parent_segment,
    segment_edge_label, trace_operations, trace_summary_node,
};

use crate::graph::{Artifact, Node};
use crate::label::DisplayNames;
use crate::parser::{FlowEvent, FunctionLogEntry, FunctionLogs};
use crate::store::TraceStore;
use crate::utils::config::{TRACE_NODE_KIND, TRACE_NODE_TITLE};
use log::{debug, warn};
use serde_json::Value;

/// Everything a trace lookup needs, passed explicitly
#[derive(Clone, Copy)]
pub struct TraceScope<'a> {
    pub interaction_id: &'a str,
    /// Unit stack suffix used in artifact names
    pub unit_stack: &'a str,
    pub region: &'a str,
    pub store: &'a dyn TraceStore,
    pub names: &'a DisplayNames,
}

/// Result of a successful correlation
#[derive(Debug, Clone)]
pub struct TraceDetail {
    /// Summary node to splice after the anchor node
    pub node: Node,
    /// WARN + ERROR log entries under the trace
    pub problem_count: usize,
    pub artifact: Artifact,
}

impl<'a> TraceScope<'a> {
    /// Artifact name for `trace_id` in this scope
    pub fn artifact_name(&self, trace_id: &str) -> String {
        format!("xray_trace_{}{}__{}", self.interaction_id, self.unit_stack, trace_id)
    }
}

/// Correlate one external invocation and build its trace detail
///
/// Returns `None` when the event names no function, the function has no
/// logs, nothing matches, or the trace store fails; each case is logged.
pub fn trace_for_invocation(
    scope: &TraceScope<'_>,
    event: &FlowEvent,
    function_logs: &FunctionLogs,
) -> Option<TraceDetail> {
    let arn = event.parameters.get("FunctionArn").and_then(Value::as_str)?;
    let Some(function_name) = function_name_from_arn(arn) else {
        debug!("Unrecognized function resource name: {}", arn);
        return None;
    };

    let entries = match function_logs.get(function_name) {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            debug!("No invocation logs for function {}", function_name);
            return None;
        }
    };

    let matched = correlate(event, entries)?;
    trace_for_id(scope, &event.node_id(), &matched.trace_id, entries)
}

/// Build the trace detail for a known trace id
///
/// # Arguments
/// * `scope` - Lookup context
/// * `anchor_id` - Id of the node the trace node follows; prefixes its id
/// * `trace_id` - Trace to fetch
/// * `entries` - Log entries to search for lines served under `trace_id`
pub fn trace_for_id(
    scope: &TraceScope<'_>,
    anchor_id: &str,
    trace_id: &str,
    entries: &[FunctionLogEntry],
) -> Option<TraceDetail> {
    let batch = match scope.store.batch(trace_id, scope.region) {
        Ok(batch) => batch,
        Err(e) => {
            warn!("Trace {} unavailable: {}", trace_id, e);
            return None;
        }
    };

    let served: Vec<&FunctionLogEntry> = entries
        .iter()
        .filter(|entry| entry.trace_id.as_deref() == Some(trace_id))
        .collect();

    let name = scope.artifact_name(trace_id);
    let artifact = build_trace_graph(&name, trace_id, &batch, &served);

    let counts = problem_counts(&served);
    let title = format!("{}  ➡️", scope.names.title_or(TRACE_NODE_KIND, TRACE_NODE_TITLE));
    let node = trace_summary_node(
        format!("{}_{}", anchor_id, trace_id),
        title,
        trace_id,
        &trace_operations(&batch),
        counts,
        &name,
    );

    Some(TraceDetail {
        node,
        problem_count: counts.0 + counts.1,
        artifact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TraceSegment;
    use crate::store::NoTraceStore;
    use crate::utils::error::TraceStoreError;
    use serde_json::json;

    struct FixedStore(Vec<TraceSegment>);

    impl TraceStore for FixedStore {
        fn batch(&self, _trace_id: &str, _region: &str) -> Result<Vec<TraceSegment>, TraceStoreError> {
            Ok(self.0.clone())
        }
    }

    fn invocation() -> FlowEvent {
        FlowEvent::from_value(
            json!({
                "Timestamp": "2024-05-01T01:02:03.000Z",
                "ContactId": "c-1",
                "ContactFlowName": "Main",
                "ContactFlowModuleType": "InvokeExternalResource",
                "Parameters": {
                    "FunctionArn": "arn:aws:lambda:ap-northeast-2:123456789012:function:lookup",
                    "Parameters": {"x": 1}
                }
            }),
            4,
        )
        .unwrap()
    }

    fn logs() -> FunctionLogs {
        let entries = FunctionLogEntry::parse_all(&[
            json!({"ContactId": "c-1", "level": "INFO", "message": "[parameter] in",
                   "parameters": {"x": 1}, "xray_trace_id": "1-a",
                   "timestamp": "2024-05-01T01:02:03.050Z"}),
            json!({"ContactId": "c-1", "level": "WARN", "message": "slow",
                   "xray_trace_id": "1-a", "timestamp": "2024-05-01T01:02:03.080Z"}),
        ]);
        let mut logs = FunctionLogs::new();
        logs.insert("lookup".to_string(), entries);
        logs
    }

    #[test]
    fn test_trace_for_invocation() {
        let store = FixedStore(
            serde_json::from_value(json!([{
                "id": "r", "name": "lookup",
                "subsegments": [{"id": "d", "name": "DynamoDB", "aws": {"operation": "GetItem", "table_name": "t"}}]
            }]))
            .unwrap(),
        );
        let names = DisplayNames::default();
        let scope = TraceScope {
            interaction_id: "c-1",
            unit_stack: "",
            region: "ap-northeast-2",
            store: &store,
            names: &names,
        };

        let detail = trace_for_invocation(&scope, &invocation(), &logs()).unwrap();
        assert_eq!(detail.node.id, "2024-05-01T010203000Z_4_1-a");
        assert_eq!(detail.node.title(), "Lambda trace  ➡️");
        assert_eq!(detail.problem_count, 1);
        assert!(detail.node.error);
        assert_eq!(detail.artifact.name, "xray_trace_c-1__1-a");
        assert!(detail.artifact.graph.contains("d"));
    }

    #[test]
    fn test_store_failure_yields_no_detail() {
        let names = DisplayNames::default();
        let scope = TraceScope {
            interaction_id: "c-1",
            unit_stack: "",
            region: "ap-northeast-2",
            store: &NoTraceStore,
            names: &names,
        };
        assert!(trace_for_invocation(&scope, &invocation(), &logs()).is_none());
    }

    #[test]
    fn test_unknown_function_yields_no_detail() {
        let names = DisplayNames::default();
        let scope = TraceScope {
            interaction_id: "c-1",
            unit_stack: "",
            region: "ap-northeast-2",
            store: &NoTraceStore,
            names: &names,
        };
        assert!(trace_for_invocation(&scope, &invocation(), &FunctionLogs::new()).is_none());
    }
}
