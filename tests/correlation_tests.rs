use flowtrace_studio::correlator::{correlate, trace_for_invocation, TraceScope};
use flowtrace_studio::label::DisplayNames;
use flowtrace_studio::parser::{FlowEvent, FunctionLogEntry, FunctionLogs};
use flowtrace_studio::store::FileTraceStore;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn invocation(parameters: Value) -> FlowEvent {
    FlowEvent::from_value(
        json!({
            "Timestamp": "2024-05-01T01:02:03.000Z",
            "ContactId": "c-1",
            "ContactFlowName": "Main",
            "ContactFlowModuleType": "InvokeExternalResource",
            "Parameters": {
                "FunctionArn": "arn:aws:lambda:ap-northeast-2:123456789012:function:lookup",
                "Parameters": parameters
            }
        }),
        0,
    )
    .unwrap()
}

fn entry(timestamp: &str, trace_id: &str, parameters: Value) -> Value {
    json!({
        "ContactId": "c-1",
        "level": "INFO",
        "message": "[parameter] received",
        "parameters": parameters,
        "timestamp": timestamp,
        "xray_trace_id": trace_id
    })
}

#[test]
fn test_nearest_candidate_wins() {
    let entries = FunctionLogEntry::parse_all(&[
        entry("2024-05-01T01:02:03.400Z", "1-far", json!({"x": 1})),
        entry("2024-05-01T01:02:03.050Z", "1-near", json!({"x": 1})),
        entry("2024-05-01T01:02:03.010Z", "1-other", json!({"x": 2})),
    ]);

    let matched = correlate(&invocation(json!({"x": 1})), &entries).unwrap();
    assert_eq!(matched.trace_id, "1-near");
    assert_eq!(matched.candidates, 2);
}

#[test]
fn test_single_candidate_matches_regardless_of_key_order() {
    let entries = FunctionLogEntry::parse_all(&[entry(
        "2024-05-01T01:02:09.000Z",
        "1-only",
        json!({"b": "2", "a": "1"}),
    )]);

    let matched = correlate(&invocation(json!({"a": "1", "b": "2"})), &entries).unwrap();
    assert_eq!(matched.trace_id, "1-only");
}

#[test]
fn test_no_candidate_is_not_an_error() {
    let entries = FunctionLogEntry::parse_all(&[entry(
        "2024-05-01T01:02:03.050Z",
        "1-a",
        json!({"x": 99}),
    )]);

    assert_eq!(correlate(&invocation(json!({"x": 1})), &entries), None);
    assert_eq!(correlate(&invocation(json!({"x": 1})), &[]), None);
}

#[test]
fn test_trace_read_from_bundle_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("batch_xray_1-near.json"),
        serde_json::to_vec(&json!([{
            "id": "root",
            "name": "lookup",
            "subsegments": [
                {"id": "s1", "name": "DynamoDB", "aws": {"operation": "GetItem", "table_name": "customers"}},
                {"id": "s2", "name": "Overhead"}
            ]
        }]))
        .unwrap(),
    )
    .unwrap();

    let mut logs = FunctionLogs::new();
    logs.insert(
        "lookup".to_string(),
        FunctionLogEntry::parse_all(&[
            entry("2024-05-01T01:02:03.050Z", "1-near", json!({"x": 1})),
            json!({"ContactId": "c-1", "level": "ERROR", "message": "lookup failed",
                   "timestamp": "2024-05-01T01:02:03.070Z", "xray_trace_id": "1-near"}),
        ]),
    );

    let store = FileTraceStore::new(dir.path());
    let names = DisplayNames::default();
    let scope = TraceScope {
        interaction_id: "c-1",
        unit_stack: "__Main",
        region: "ap-northeast-2",
        store: &store,
        names: &names,
    };

    let detail = trace_for_invocation(&scope, &invocation(json!({"x": 1})), &logs).unwrap();
    assert_eq!(detail.artifact.name, "xray_trace_c-1__Main__1-near");
    assert_eq!(detail.problem_count, 1);
    assert!(detail.node.error);
    assert!(detail.artifact.graph.contains("s1"));
    assert!(!detail.artifact.graph.contains("s2"));
}

#[test]
fn test_missing_trace_file_yields_no_detail() {
    let dir = tempfile::tempdir().unwrap();
    let mut logs = FunctionLogs::new();
    logs.insert(
        "lookup".to_string(),
        FunctionLogEntry::parse_all(&[entry("2024-05-01T01:02:03.050Z", "1-gone", json!({"x": 1}))]),
    );

    let store = FileTraceStore::new(dir.path());
    let names = DisplayNames::default();
    let scope = TraceScope {
        interaction_id: "c-1",
        unit_stack: "",
        region: "ap-northeast-2",
        store: &store,
        names: &names,
    };

    assert!(trace_for_invocation(&scope, &invocation(json!({"x": 1})), &logs).is_none());
}
