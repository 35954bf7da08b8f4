use flowtrace_studio::graph::{
    attribute_table, build_interaction_graph, compose, link_interactions, AssemblyContext,
    InteractionOutcome, NodeLink,
};
use flowtrace_studio::label::DisplayNames;
use flowtrace_studio::parser::{ContactSummary, FlowEvent, FunctionLogs};
use flowtrace_studio::store::NoTraceStore;
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn events(contact: &str, base_second: u32, types: &[(&str, Value)]) -> Vec<FlowEvent> {
    types
        .iter()
        .enumerate()
        .map(|(i, (module_type, extra))| {
            let mut record = json!({
                "Timestamp": format!("2024-05-01T01:02:{:02}.000Z", base_second + i as u32),
                "ContactId": contact,
                "ContactFlowName": "Main",
                "ContactFlowModuleType": module_type,
            });
            if let (Value::Object(base), Value::Object(more)) = (&mut record, extra.clone()) {
                base.extend(more);
            }
            FlowEvent::from_value(record, i).unwrap()
        })
        .collect()
}

fn outcome(summary: ContactSummary, events: &[FlowEvent], attributes: IndexMap<String, Value>) -> InteractionOutcome {
    let logs = FunctionLogs::new();
    let names = DisplayNames::default();
    let ctx = AssemblyContext::new(&summary.contact_id, "ap-northeast-2", &logs, &NoTraceStore, &names);
    let flow = build_interaction_graph(&ctx, events);
    InteractionOutcome {
        attributes: attribute_table(&attributes, events),
        summary,
        flow,
        ..Default::default()
    }
}

fn summary(id: &str, previous: Option<&str>, related: Option<&str>, method: &str) -> ContactSummary {
    ContactSummary {
        contact_id: id.to_string(),
        previous_contact_id: previous.map(str::to_string),
        related_contact_id: related.map(str::to_string),
        initiation_method: method.to_string(),
        channel: "VOICE".to_string(),
    }
}

#[test]
fn test_related_interactions_link_undirected() {
    let a = outcome(
        summary("A", None, None, "INBOUND"),
        &events("A", 1, &[("PlayPrompt", json!({})), ("Dial", json!({}))]),
        IndexMap::new(),
    );
    let b = outcome(
        summary("B", None, Some("A"), "API"),
        &events("B", 10, &[("PlayPrompt", json!({}))]),
        IndexMap::new(),
    );

    let a_first = a.flow.first_node().unwrap().to_string();
    let a_last = a.flow.last_node().unwrap().to_string();
    let b_first = b.flow.first_node().unwrap().to_string();

    let edges = link_interactions(&[a, b]);

    let start_to_a = edges
        .iter()
        .find(|e| e.from == "start" && e.to == a_first)
        .unwrap();
    assert_eq!(start_to_a.label.as_deref(), Some("INBOUND"));

    let related = edges
        .iter()
        .find(|e| e.from == a_last && e.to == b_first)
        .unwrap();
    assert_eq!(related.label.as_deref(), Some("Related"));
    assert!(related.undirected);
}

#[test]
fn test_transfer_links_from_predecessor_last_node() {
    let a = outcome(
        summary("A", None, None, "INBOUND"),
        &events("A", 1, &[("PlayPrompt", json!({}))]),
        IndexMap::new(),
    );
    let b = outcome(
        summary("B", Some("A"), None, "TRANSFER"),
        &events("B", 10, &[("PlayPrompt", json!({}))]),
        IndexMap::new(),
    );

    let edges = link_interactions(&[a, b]);
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].from, "start");
    assert_eq!(edges[1].label.as_deref(), Some("TRANSFER"));
    assert!(!edges[1].undirected);
}

#[test]
fn test_attribute_provenance_borrowed_from_sibling() {
    let mut a_attributes = IndexMap::new();
    a_attributes.insert("lang".to_string(), json!("ko"));
    let a = outcome(
        summary("A", None, None, "INBOUND"),
        &events(
            "A",
            1,
            &[("SetAttributes", json!({"Identifier": "Set language", "Parameters": {"lang": "ko"}}))],
        ),
        a_attributes,
    );

    let mut b_attributes = IndexMap::new();
    b_attributes.insert("lang".to_string(), json!("ko"));
    b_attributes.insert("tier".to_string(), json!("gold"));
    let b = outcome(
        summary("B", Some("A"), None, "TRANSFER"),
        &events("B", 10, &[("PlayPrompt", json!({}))]),
        b_attributes,
    );

    assert_eq!(b.attributes[0].source_flow, None);

    let composition = compose("B", vec![a, b]);
    let cluster = composition
        .graph
        .clusters
        .iter()
        .find(|c| c.id == "cluster_B")
        .unwrap();
    assert!(cluster.label.contains("✅"));

    let badge = cluster.graph.node("B_attributes").unwrap();
    let NodeLink::Raw(payload) = &badge.link else {
        panic!("attributes badge should carry its table");
    };
    let table: Value = serde_json::from_str(payload).unwrap();

    assert_eq!(table[0]["key"], "lang");
    assert_eq!(table[0]["value"], "\"ko\"");
    assert_eq!(table[0]["source_flow"], "Main");
    assert_eq!(table[0]["block_identifier"], "Set language");
    assert_eq!(table[0]["borrowed"], true);
    assert_eq!(table[1]["key"], "tier");
    assert_eq!(table[1]["source_flow"], Value::Null);
}

#[test]
fn test_failed_interaction_gets_empty_cluster() {
    let a = outcome(
        summary("A", None, None, "INBOUND"),
        &events("A", 1, &[("PlayPrompt", json!({}))]),
        IndexMap::new(),
    );
    let b = InteractionOutcome::failed(summary("B", Some("A"), None, "TRANSFER"));

    let composition = compose("A", vec![a, b]);
    let failed = composition
        .graph
        .clusters
        .iter()
        .find(|c| c.id == "cluster_B")
        .unwrap();
    assert!(failed.graph.nodes.is_empty());
    assert_eq!(composition.graph.edges.len(), 1);
}
