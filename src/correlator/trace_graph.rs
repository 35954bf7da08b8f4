//! Trace batch sub-graphs.
//!
//! A correlated invocation gets one summary node in its flow graph and one
//! artifact showing the downstream calls of its trace batch next to the log
//! lines the function wrote while serving it.

use crate::graph::{Artifact, Edge, Graph, Node, NodeCard, NodeLink};
use crate::label::{displayable_block_id, wrap};
use crate::parser::{FunctionLogEntry, LogLevel, TraceSegment};
use crate::utils::config::{
    LOG_LINE_WIDTH, NODE_TEXT_WIDTH, RESOURCE_LABELED_SERVICES, SKIPPED_SEGMENT_NAMES, TRACE_NODE_KIND,
};
use serde_json::Value;

/// Every segment of a batch, depth first
pub fn flatten_segments(batch: &[TraceSegment]) -> Vec<&TraceSegment> {
    fn visit<'a>(segment: &'a TraceSegment, out: &mut Vec<&'a TraceSegment>) {
        out.push(segment);
        for child in &segment.subsegments {
            visit(child, out);
        }
    }

    let mut out = Vec::new();
    for segment in batch {
        visit(segment, &mut out);
    }
    out
}

/// Downstream operations of a batch, consecutive repeats collapsed
///
/// Each entry reads `operation resource` or, without a resource name,
/// `operation segment-name`.
pub fn trace_operations(batch: &[TraceSegment]) -> Vec<String> {
    let mut operations: Vec<String> = Vec::new();

    for segment in flatten_segments(batch) {
        let Some(aws) = &segment.aws else { continue };
        let Some(operation) = &aws.operation else { continue };

        let op = match aws.resource_names.first() {
            Some(resource) => format!("{} {}", operation, resource),
            None => format!("{} {}", operation, segment.name),
        };
        if operations.last() != Some(&op) {
            operations.push(op);
        }
    }

    operations
}

/// Head label and failure annotation of the edge into `segment`
pub fn segment_edge_label(segment: &TraceSegment) -> (Option<String>, Option<String>) {
    let name = segment.name.as_str();
    let operation = segment
        .aws
        .as_ref()
        .and_then(|aws| aws.operation.clone())
        .unwrap_or_default();

    if RESOURCE_LABELED_SERVICES.contains(&name) {
        let resource = segment
            .aws
            .as_ref()
            .and_then(|aws| aws.resource_names.first())
            .and_then(|r| r.rsplit('/').next());
        let label = match resource {
            Some(resource) => format!("{}\n{}", operation, resource),
            None => operation,
        };
        return (Some(label), None);
    }

    if name == "DynamoDB" {
        let label = match segment.aws.as_ref().and_then(|aws| aws.table_name.as_ref()) {
            Some(table) => format!("{}\n{}", operation, table),
            None => operation,
        };
        return (Some(label), None);
    }

    // Host-named segments are outbound HTTP calls
    if name.contains('.') {
        let http = segment.http.as_ref();
        let request = http.and_then(|h| h.request.as_ref());
        let method = request.map(|r| r.method.as_str()).unwrap_or_default();
        let path = request
            .map(|r| r.url.split('/').skip(3).collect::<Vec<_>>().join("/"))
            .unwrap_or_default();

        let failure = match http.and_then(|h| h.response.as_ref()) {
            Some(response) => {
                let status = match &response.status {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (!status.starts_with('2')).then_some(status)
            }
            None => segment
                .cause
                .as_ref()
                .and_then(|c| c.exceptions.first())
                .and_then(|e| e.message.clone()),
        };

        return (Some(format!("{}\n{}", method, path)), failure);
    }

    (None, None)
}

/// Root segment that issued the call recorded by `parent_id`
///
/// A root segment's parent is a subsegment of some other root; that
/// subsegment's root in turn names the invocation subsegment, whose owning
/// root is the caller.
pub fn resolve_parent_segment<'a>(parent_id: Option<&str>, batch: &'a [TraceSegment]) -> Option<&'a str> {
    let parent_id = parent_id?;

    let owner_of = |id: &str| {
        batch
            .iter()
            .find(|segment| segment.subsegments.iter().any(|sub| sub.id == id))
    };

    let invocation_id = owner_of(parent_id)?.parent_id.as_deref()?;
    owner_of(invocation_id).map(|segment| segment.id.as_str())
}

fn raw_link<T: serde::Serialize>(payload: &T) -> NodeLink {
    NodeLink::Raw(serde_json::to_string_pretty(payload).unwrap_or_default())
}

fn segment_node(segment: &TraceSegment) -> Node {
    Node::badge(segment.id.clone(), segment.name.clone(), segment.name.clone(), raw_link(segment))
}

fn segment_edge(parent_id: &str, segment: &TraceSegment) -> Edge {
    let (head_label, error_label) = segment_edge_label(segment);
    Edge {
        head_label,
        error_label,
        side_ports: true,
        ..Edge::new(parent_id, segment.id.clone())
    }
}

fn is_skipped(segment: &TraceSegment) -> bool {
    SKIPPED_SEGMENT_NAMES.contains(&segment.name.as_str())
}

/// Subsegment nodes of one root, with `Invocation`/`Attempt` wrappers lifted
fn add_subsegments(graph: &mut Graph, root: &TraceSegment) {
    for sub in root.subsegments.iter().filter(|s| !is_skipped(s)) {
        if sub.name == "Invocation" || sub.name.contains("Attempt") {
            for lifted in sub.subsegments.iter().filter(|s| !is_skipped(s)) {
                graph.add_node(segment_node(lifted));
                graph.edges.push(segment_edge(&root.id, lifted));
            }
        } else {
            graph.add_node(segment_node(sub));
            graph.edges.push(segment_edge(&root.id, sub));
        }
    }
}

/// Title of an invocation log node by level
fn level_title(level: &LogLevel) -> String {
    match level {
        LogLevel::Warn => format!("⚠️   {}", level.as_str()),
        LogLevel::Error => format!("🚨   {}", level.as_str()),
        other => other.as_str().to_string(),
    }
}

fn key_value_lines(payload: Option<&Value>) -> String {
    let mut text = String::new();
    if let Some(Value::Object(map)) = payload {
        for (key, value) in map {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            text.push_str(&wrap(&format!("{} : {}", key, value), LOG_LINE_WIDTH, true));
            text.push('\n');
        }
    }
    text
}

/// Body text of one invocation log node, by payload kind
pub fn log_entry_text(entry: &FunctionLogEntry) -> String {
    let message = entry.message.as_str();

    let text = if message.contains("parameter") {
        let mut text = key_value_lines(entry.parameters.as_ref());
        if message.contains("lex") {
            let intent = match &entry.intent {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            text.push_str(&format!("intent : {}", intent));
        }
        text
    } else if message.contains("attribute") {
        key_value_lines(entry.attributes.as_ref())
    } else if message.contains("lex") {
        format!(
            "{}{}",
            message.replace(']', "]\n"),
            entry.input_transcript().unwrap_or_default()
        )
    } else {
        message.replace(']', "]\n")
    };

    wrap(&text, NODE_TEXT_WIDTH, true)
}

fn log_entry_node(trace_id: &str, index: usize, entry: &FunctionLogEntry) -> Node {
    let id = format!(
        "{}_{}_{}",
        trace_id,
        entry.raw_timestamp.replace([':', '.'], ""),
        index
    );
    let shows_message = entry.message.contains("parameter") || entry.message.contains("attribute");

    let card = NodeCard {
        kind: entry.level.as_str().to_string(),
        title: level_title(&entry.level),
        block_id: shows_message.then(|| entry.message.clone()),
        body: log_entry_text(entry),
        footer: None,
    };

    Node::card(id, card, entry.level.is_problem(), raw_link(&entry.raw))
}

/// Artifact for one trace batch
///
/// # Arguments
/// * `name` - Artifact name
/// * `trace_id` - Trace the batch was recorded under
/// * `batch` - Root segments of the batch
/// * `entries` - Invocation log entries carrying `trace_id`, in log order
pub fn build_trace_graph(name: &str, trace_id: &str, batch: &[TraceSegment], entries: &[&FunctionLogEntry]) -> Artifact {
    let mut graph = Graph::new(name).with_title(format!("xray_trace_id : {}", trace_id));

    for root in batch {
        if root.subsegments.is_empty() {
            continue;
        }

        graph.add_node(segment_node(root));
        add_subsegments(&mut graph, root);

        if let Some(parent) = resolve_parent_segment(root.parent_id.as_deref(), batch) {
            graph.edges.push(Edge::new(parent, root.id.clone()));
        }
    }

    if !entries.is_empty() {
        let raw: Vec<&Value> = entries.iter().map(|e| &e.raw).collect();
        graph.add_node(Node::badge(
            format!("{}_raw_json", trace_id),
            "CloudWatch",
            "Raw Json",
            raw_link(&raw),
        ));

        let mut order = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let node = log_entry_node(trace_id, index, entry);
            order.push(node.id.clone());
            graph.add_node(node);
        }
        graph = graph.chain(&order);
    }

    Artifact {
        name: name.to_string(),
        graph,
    }
}

/// Warn and error counts of the entries served under one trace
pub fn problem_counts(entries: &[&FunctionLogEntry]) -> (usize, usize) {
    entries.iter().fold((0, 0), |(warn, error), entry| match entry.level {
        LogLevel::Warn => (warn + 1, error),
        LogLevel::Error => (warn, error + 1),
        _ => (warn, error),
    })
}

/// Summary node spliced after the invocation node
pub fn trace_summary_node(
    id: String,
    title: String,
    trace_id: &str,
    operations: &[String],
    counts: (usize, usize),
    artifact: &str,
) -> Node {
    let body: String = operations
        .iter()
        .enumerate()
        .map(|(i, op)| format!("Operation {} : \n{}\n", i + 1, op))
        .collect();

    let (warn, error) = counts;
    let mut footer = Vec::new();
    if warn > 0 {
        footer.push(format!("Warn : {}", warn));
    }
    if error > 0 {
        footer.push(format!("Error : {}", error));
    }

    let card = NodeCard {
        kind: TRACE_NODE_KIND.to_string(),
        title,
        block_id: displayable_block_id(Some(trace_id)),
        body,
        footer: (!footer.is_empty()).then(|| footer.join("\n")),
    };

    Node::card(id, card, warn + error > 0, NodeLink::Artifact(artifact.to_string()))
}
