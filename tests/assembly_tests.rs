use flowtrace_studio::aggregator::is_error;
use flowtrace_studio::graph::{build_flow_graph, build_interaction_graph, AssemblyContext, UnitScope};
use flowtrace_studio::label::DisplayNames;
use flowtrace_studio::parser::{FlowEvent, FunctionLogs};
use flowtrace_studio::store::NoTraceStore;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashSet;

fn event(ordinal: usize, second: u32, flow: &str, module_type: &str, extra: Value) -> FlowEvent {
    let mut record = json!({
        "Timestamp": format!("2024-05-01T01:02:{:02}.000Z", second),
        "ContactId": "c-1",
        "ContactFlowName": flow,
        "ContactFlowModuleType": module_type,
    });
    if let (Value::Object(base), Value::Object(more)) = (&mut record, extra) {
        base.extend(more);
    }
    FlowEvent::from_value(record, ordinal).unwrap()
}

#[test]
fn test_aggregatable_run_collapses_to_one_node() {
    let events = vec![
        event(0, 1, "Main", "PlayPrompt", json!({"Parameters": {"Text": "Welcome"}})),
        event(1, 2, "Main", "SetAttributes", json!({"Parameters": {"a": "1"}})),
        event(2, 3, "Main", "SetAttributes", json!({"Parameters": {"b": "2"}})),
        event(3, 4, "Main", "SetAttributes", json!({"Parameters": {"c": "3"}})),
        event(4, 5, "Main", "Disconnect", json!({})),
    ];

    let logs = FunctionLogs::new();
    let names = DisplayNames::default();
    let ctx = AssemblyContext::new("c-1", "ap-northeast-2", &logs, &NoTraceStore, &names);
    let built = build_flow_graph(&ctx, &UnitScope::flow("c-1", "k", "Main"), &events).unwrap();

    assert_eq!(built.order.len(), 3);
    assert_eq!(built.graph.edges.len(), 2);
    assert_eq!(built.error_count, 0);

    let aggregate = built.graph.node(&built.order[1]).unwrap();
    assert!(aggregate.title().contains("x 3"));
}

#[test]
fn test_edges_chain_every_emitted_node() {
    let events: Vec<FlowEvent> = (0..7)
        .map(|i| {
            let module_type = if i % 2 == 0 { "PlayPrompt" } else { "Dial" };
            event(i, i as u32, "Main", module_type, json!({}))
        })
        .collect();

    let logs = FunctionLogs::new();
    let names = DisplayNames::default();
    let ctx = AssemblyContext::new("c-1", "ap-northeast-2", &logs, &NoTraceStore, &names);
    let built = build_flow_graph(&ctx, &UnitScope::flow("c-1", "k", "Main"), &events).unwrap();

    assert_eq!(built.order.len(), 7);
    assert_eq!(built.graph.edges.len(), built.order.len() - 1);
    for (edge, pair) in built.graph.edges.iter().zip(built.order.windows(2)) {
        assert_eq!(edge.from, pair[0]);
        assert_eq!(edge.to, pair[1]);
    }
}

#[test]
fn test_sibling_modules_have_disjoint_nodes() {
    let events = vec![
        event(0, 1, "Main", "PlayPrompt", json!({"ContactFlowId": "flow-main"})),
        event(1, 2, "MOD_Auth", "Dial", json!({"ModuleExecutionStack": ["m-auth", "flow-main"]})),
        event(2, 3, "MOD_Auth", "Resume", json!({"ModuleExecutionStack": ["m-auth", "flow-main"]})),
        event(3, 4, "Main", "Dial", json!({"ContactFlowId": "flow-main"})),
        event(4, 5, "MOD_Menu", "Dial", json!({"ModuleExecutionStack": ["m-menu", "flow-main"]})),
    ];

    let logs = FunctionLogs::new();
    let names = DisplayNames::default();
    let ctx = AssemblyContext::new("c-1", "ap-northeast-2", &logs, &NoTraceStore, &names);
    let built = build_interaction_graph(&ctx, &events);

    let auth = built
        .artifacts
        .iter()
        .find(|a| a.name == "module_c-1__Main__MOD_Auth")
        .unwrap();
    let menu = built
        .artifacts
        .iter()
        .find(|a| a.name == "module_c-1__Main__MOD_Menu")
        .unwrap();

    let auth_ids: HashSet<&str> = auth.graph.nodes.iter().map(|n| n.id.as_str()).collect();
    let menu_ids: HashSet<&str> = menu.graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(auth_ids.len(), 2);
    assert_eq!(menu_ids.len(), 1);
    assert!(auth_ids.is_disjoint(&menu_ids));
}

#[test]
fn test_classification_is_stable_and_tolerant() {
    let failed = event(
        0,
        1,
        "Main",
        "InvokeExternalResource",
        json!({"ExternalResults": {"isSuccess": "false"}}),
    );
    let no_flag = event(1, 2, "Main", "InvokeExternalResource", json!({"ExternalResults": {"status": "ok"}}));
    let wrong_type = event(2, 3, "Main", "InvokeExternalResource", json!({"ExternalResults": {"isSuccess": false}}));
    let keyword = event(3, 4, "Main", "CheckAttribute", json!({"Results": "MultipleFound"}));

    assert!(is_error(&failed));
    assert_eq!(is_error(&failed), is_error(&failed));
    assert!(!is_error(&no_flag));
    assert!(!is_error(&wrong_type));
    assert!(is_error(&keyword));
}
