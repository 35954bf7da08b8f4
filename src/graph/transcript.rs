//! Conversation graphs.
//!
//! Call-recording transcripts and conversational-assistant turns are shown
//! as their own artifacts next to the flow graph, each reachable from a
//! link node in the interaction's cluster.

use super::model::{Artifact, Graph, Node, NodeCard, NodeLink};
use crate::correlator::{trace_for_id, TraceScope};
use crate::label::{display_value, wrap_transcript};
use crate::parser::{parse_timestamp, FunctionLogEntry, LexTurn, TranscriptSegment};
use log::debug;
use serde_json::Value;

fn plain_card(kind: &str, body: String, footer: Option<String>) -> NodeCard {
    NodeCard {
        kind: kind.to_string(),
        title: kind.to_string(),
        block_id: None,
        body,
        footer,
    }
}

fn raw_link<T: serde::Serialize>(payload: &T) -> NodeLink {
    NodeLink::Raw(serde_json::to_string_pretty(payload).unwrap_or_default())
}

/// Call-recording transcript as a chain of utterances
///
/// Consecutive utterances of one participant merge into a single node,
/// their contents joined by `/` in begin-offset order.
pub fn transcript_graph(interaction_id: &str, segments: &[TranscriptSegment]) -> Option<Artifact> {
    if segments.is_empty() {
        return None;
    }

    let name = format!("transcript_{}", interaction_id);
    let mut graph = Graph::new(name.clone());
    let mut order = Vec::new();

    for run in segments.chunk_by(|a, b| a.participant_id == b.participant_id) {
        let mut members: Vec<&TranscriptSegment> = run.iter().collect();
        members.sort_by_key(|s| s.begin_offset_millis);

        let content = members
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("/");
        let participant = members[0].participant_id.to_lowercase();
        let link = if members.len() == 1 {
            raw_link(members[0])
        } else {
            raw_link(&members)
        };

        let node = Node::card(
            members[0].id.clone(),
            plain_card(&participant, wrap_transcript(&content), None),
            false,
            link,
        );
        let id = node.id.clone();
        if graph.add_node(node) {
            order.push(id);
        }
    }

    Some(Artifact {
        name,
        graph: graph.chain(&order),
    })
}

fn confidence_text(confidence: Option<&Value>) -> String {
    match confidence {
        Some(Value::Object(map)) => map.get("score").map(display_value).unwrap_or_else(|| "0.0".into()),
        Some(value) => display_value(value),
        None => "0.0".to_string(),
    }
}

/// Interpretation lines; `*` marks the intent the session settled on
fn intent_lines(turn: &LexTurn) -> String {
    let session_intent = turn.session_state.intent.as_ref().map(|i| i.name.as_str());

    turn.interpretations
        .iter()
        .map(|interpretation| {
            let name = interpretation.intent.name.as_str();
            let marker = if Some(name) == session_intent { "* " } else { "" };
            format!(
                "{}{} : {}\n",
                marker,
                name,
                confidence_text(interpretation.nlu_confidence.as_ref())
            )
        })
        .collect()
}

/// Trace id of the hook invocation that served `turn`
///
/// Hook entries logged for the same utterance are candidates; the one
/// closest to the turn's timestamp wins, the first one when the turn has
/// no usable timestamp.
pub fn hook_trace_for_turn(turn: &LexTurn, hook_logs: &[FunctionLogEntry]) -> Option<String> {
    let turn_time = turn.timestamp.as_deref().and_then(|ts| parse_timestamp(ts).ok());

    hook_logs
        .iter()
        .filter(|entry| entry.trace_id.is_some())
        .filter(|entry| entry.input_transcript() == Some(turn.input_transcript.as_str()))
        .min_by_key(|entry| match (turn_time, entry.timestamp) {
            (Some(turn_time), Some(ts)) => (ts - turn_time).num_milliseconds().abs(),
            _ => i64::MAX,
        })
        .and_then(|entry| entry.trace_id.clone())
}

/// Assistant conversation: customer and agent node per turn
///
/// When hook logs exist the turn's hook trace node sits between the two.
///
/// # Returns
/// The `lex_{id}` artifact and the trace artifacts it links to, or `None`
/// when there are no turns.
pub fn lex_graph(
    scope: &TraceScope<'_>,
    turns: &[LexTurn],
    hook_logs: &[FunctionLogEntry],
) -> Option<(Artifact, Vec<Artifact>)> {
    if turns.is_empty() {
        return None;
    }

    let name = format!("lex_{}", scope.interaction_id);
    let mut graph = Graph::new(name.clone());
    let mut order = Vec::new();
    let mut traces = Vec::new();

    for (index, turn) in turns.iter().enumerate() {
        let base = turn
            .request_id
            .clone()
            .unwrap_or_else(|| format!("turn-{}", index));
        let customer_id = format!("{}-customer", base);

        let intents = intent_lines(turn);
        let customer = Node::card(
            customer_id.clone(),
            plain_card(
                "customer",
                wrap_transcript(&turn.input_transcript),
                (!intents.is_empty()).then_some(intents),
            ),
            false,
            raw_link(turn),
        );
        if !graph.add_node(customer) {
            continue;
        }
        order.push(customer_id.clone());

        if let Some(trace_id) = hook_trace_for_turn(turn, hook_logs) {
            if let Some(detail) = trace_for_id(scope, &customer_id, &trace_id, hook_logs) {
                let trace_node_id = detail.node.id.clone();
                if graph.add_node(detail.node) {
                    order.push(trace_node_id);
                    traces.push(detail.artifact);
                }
            }
        }

        let agent_id = format!("{}-agent", base);
        let said: String = turn.messages.iter().map(|m| m.content.as_str()).collect();
        let tool = turn
            .session_state
            .session_attributes
            .get("Tool")
            .map(display_value)
            .filter(|t| !t.is_empty());

        let agent = Node::card(
            agent_id.clone(),
            plain_card("agent", wrap_transcript(&said), tool.map(|t| format!("Tool : {}", t))),
            false,
            raw_link(turn),
        );
        if graph.add_node(agent) {
            order.push(agent_id);
        }
    }

    debug!("Assistant transcript: {} turns, {} traces", turns.len(), traces.len());

    Some((
        Artifact {
            name,
            graph: graph.chain(&order),
        },
        traces,
    ))
}

/// One trace node per distinct trace id in the hook logs, first-seen order
pub fn lex_hook_graph(scope: &TraceScope<'_>, hook_logs: &[FunctionLogEntry]) -> Option<(Artifact, Vec<Artifact>)> {
    let mut trace_ids: Vec<&str> = Vec::new();
    for id in hook_logs.iter().filter_map(|e| e.trace_id.as_deref()) {
        if !trace_ids.contains(&id) {
            trace_ids.push(id);
        }
    }
    if trace_ids.is_empty() {
        return None;
    }

    let name = format!("lex_hook_{}", scope.interaction_id);
    let mut graph = Graph::new(name.clone());
    let mut order = Vec::new();
    let mut traces = Vec::new();

    for trace_id in trace_ids {
        if let Some(detail) = trace_for_id(scope, scope.interaction_id, trace_id, hook_logs) {
            let id = detail.node.id.clone();
            if graph.add_node(detail.node) {
                order.push(id);
                traces.push(detail.artifact);
            }
        }
    }

    Some((
        Artifact {
            name,
            graph: graph.chain(&order),
        },
        traces,
    ))
}

/// Small node in an interaction's cluster pointing at a conversation artifact
pub fn link_node(interaction_id: &str, suffix: &str, kind: &str, caption: &str, artifact: &str) -> Node {
    Node::badge(
        format!("{}_{}", interaction_id, suffix),
        kind,
        caption,
        NodeLink::Artifact(artifact.to_string()),
    )
}

/// Every conversation artifact of one interaction, with its link nodes
pub fn conversation_artifacts(
    scope: &TraceScope<'_>,
    transcript: &[TranscriptSegment],
    turns: &[LexTurn],
    hook_logs: &[FunctionLogEntry],
) -> (Vec<Node>, Vec<Artifact>) {
    let id = scope.interaction_id;
    let mut links = Vec::new();
    let mut artifacts = Vec::new();

    if let Some(artifact) = transcript_graph(id, transcript) {
        links.push(link_node(id, "transcript", "Transcript", "Transcript", &artifact.name));
        artifacts.push(artifact);
    }

    if let Some((artifact, traces)) = lex_graph(scope, turns, hook_logs) {
        links.push(link_node(id, "lex_script", "Lex", "Lex", &artifact.name));
        artifacts.push(artifact);
        artifacts.extend(traces);
    }

    if let Some((artifact, traces)) = lex_hook_graph(scope, hook_logs) {
        links.push(link_node(id, "lex_hook", "Lambda", "Lex Hook", &artifact.name));
        artifacts.push(artifact);
        artifacts.extend(traces);
    }

    (links, artifacts)
}
