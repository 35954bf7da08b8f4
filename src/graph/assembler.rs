//! Flow graph assembly.
//!
//! Events are walked in time order. Consecutive attribute-set events are
//! collapsed, omitted bookkeeping events are dropped, reusable modules are
//! summarized by one node pointing at their own sub-graph, and correlated
//! invocations get a trace node spliced in right after them.
//!
//! At the interaction level the event log is cut into flow segments, each
//! summarized by one node whose artifact is the segment's flow graph.

use super::model::{Artifact, Graph, Node, NodeCard, NodeLink};
use crate::aggregator::{is_error, AggregateBucket, Deduplicator};
use crate::correlator::{trace_for_invocation, TraceScope};
use crate::label::{decorate_footer, display_kind, displayable_block_id, node_text, DisplayNames};
use crate::parser::{FlowEvent, FunctionLogs};
use crate::store::TraceStore;
use crate::utils::config::MODULE_FLOW_MARKER;
use crate::utils::error::AssemblyError;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// Shared, read-only inputs of one interaction's assembly
#[derive(Clone)]
pub struct AssemblyContext<'a> {
    pub interaction_id: &'a str,
    pub region: &'a str,
    pub function_logs: &'a FunctionLogs,
    pub store: &'a dyn TraceStore,
    pub names: &'a DisplayNames,
    /// Flow id -> flow name, used to place modules under their caller
    flow_index: HashMap<String, String>,
}

impl<'a> AssemblyContext<'a> {
    pub fn new(
        interaction_id: &'a str,
        region: &'a str,
        function_logs: &'a FunctionLogs,
        store: &'a dyn TraceStore,
        names: &'a DisplayNames,
    ) -> Self {
        Self {
            interaction_id,
            region,
            function_logs,
            store,
            names,
            flow_index: HashMap::new(),
        }
    }

    /// Copy of this context that knows the flow ids seen in `events`
    pub fn indexed(&self, events: &[FlowEvent]) -> Self {
        let mut ctx = self.clone();
        for event in events {
            if let Some(id) = &event.flow_id {
                if !is_module_flow(&event.flow_name) {
                    ctx.flow_index
                        .entry(id.clone())
                        .or_insert_with(|| event.flow_name.clone());
                }
            }
        }
        ctx
    }

    /// Name of the non-module flow a module execution stack points at
    fn caller_flow(&self, stack: &[String]) -> Option<&str> {
        stack
            .iter()
            .find_map(|id| self.flow_index.get(id))
            .map(String::as_str)
    }

    fn trace_scope<'s>(&'s self, unit: &'s UnitScope) -> TraceScope<'s> {
        TraceScope {
            interaction_id: self.interaction_id,
            unit_stack: &unit.stack,
            region: self.region,
            store: self.store,
            names: self.names,
        }
    }
}

/// What kind of nested unit a graph describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// A run of one contact flow
    Flow,
    /// A reusable module invoked from a flow
    Module,
}

impl UnitKind {
    /// Kind shown on the unit's summary node
    fn summary_kind(&self) -> &'static str {
        match self {
            Self::Flow => "TransferToFlow",
            Self::Module => "InvokeFlowModule",
        }
    }
}

/// Identity of the unit being assembled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitScope {
    pub kind: UnitKind,
    /// Flow or module name; also the graph title
    pub name: String,
    /// `__{flow}` or `__{parentFlow}__{module}`
    pub stack: String,
    /// Artifact name of the unit's own graph
    pub artifact: String,
}

impl UnitScope {
    /// A flow segment starting at `segment_key`
    pub fn flow(interaction_id: &str, segment_key: &str, flow_name: &str) -> Self {
        let stack = format!("__{}", flow_name);
        Self {
            kind: UnitKind::Flow,
            name: flow_name.to_string(),
            artifact: format!("flow_{}_{}{}", interaction_id, segment_key, stack),
            stack,
        }
    }

    /// A module invoked from `parent_flow`
    pub fn module(interaction_id: &str, parent_flow: &str, module_name: &str) -> Self {
        let stack = format!("__{}__{}", parent_flow, module_name);
        Self {
            kind: UnitKind::Module,
            name: module_name.to_string(),
            artifact: format!("module_{}{}", interaction_id, stack),
            stack,
        }
    }
}

/// Assembled graph of one unit
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    pub graph: Graph,
    /// Node ids in append order; the edge chain follows it
    pub order: Vec<String>,
    /// Direct errors plus every nested unit's and trace's own count
    pub error_count: usize,
    /// Artifacts of nested units and traces, depth first
    pub artifacts: Vec<Artifact>,
}

impl FlowGraph {
    fn new(graph: Graph) -> Self {
        Self {
            graph,
            ..Default::default()
        }
    }

    fn push(&mut self, node: Node) {
        let id = node.id.clone();
        if self.graph.add_node(node) {
            self.order.push(id);
        }
    }

    fn push_buckets(&mut self, buckets: Vec<AggregateBucket>, names: &DisplayNames) {
        for bucket in buckets {
            self.push(bucket.into_node(names));
        }
    }

    /// Chain the nodes in append order and rank-group them
    fn finish(mut self) -> Self {
        self.graph = self.graph.chain(&self.order);
        self
    }

    pub fn first_node(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    pub fn last_node(&self) -> Option<&str> {
        self.order.last().map(String::as_str)
    }
}

pub fn is_module_flow(flow_name: &str) -> bool {
    flow_name.contains(MODULE_FLOW_MARKER)
}

/// Whether `event` belongs to a module nested inside `unit`
fn is_nested(event: &FlowEvent, unit: &UnitScope) -> bool {
    is_module_flow(&event.flow_name) && event.flow_name != unit.name
}

/// Time-ordered view; equal timestamps keep input order
fn time_ordered(events: &[FlowEvent]) -> Vec<&FlowEvent> {
    let mut ordered: Vec<&FlowEvent> = events.iter().collect();
    ordered.sort_by_key(|e| (e.timestamp, e.ordinal));
    ordered
}

/// Node for one regular event
fn event_node(names: &DisplayNames, event: &FlowEvent, error: bool) -> Result<Node, AssemblyError> {
    let text = node_text(event).map_err(|source| AssemblyError::NodeText {
        block: event.node_id(),
        source,
    })?;
    let kind = display_kind(&event.module_type, &event.parameters);

    let card = NodeCard {
        title: names.title(&kind),
        kind,
        block_id: displayable_block_id(event.block_identifier.as_deref()),
        body: text.body,
        footer: text.footer.as_ref().map(decorate_footer),
    };
    let link = NodeLink::Raw(serde_json::to_string_pretty(&event.raw).unwrap_or_default());

    Ok(Node::card(event.node_id(), card, error, link))
}

fn span_text(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Summary node standing in for a whole nested unit
///
/// A degraded summary marks a unit whose own graph could not be built; it
/// is error-colored and links nowhere.
fn summary_node(id: String, unit: &UnitScope, members: &[FlowEvent], error_count: usize, degraded: bool) -> Node {
    let min = members.iter().map(|e| e.timestamp).min();
    let max = members.iter().map(|e| e.timestamp).max();
    let body = match (min, max) {
        (Some(min), Some(max)) => format!("{} ~ \n{}", span_text(&min), span_text(&max)),
        _ => String::new(),
    };

    let mut footer = format!("Nodes : {}\n", members.len());
    if error_count > 0 {
        footer.push_str(&format!("Errors: {}", error_count));
    }

    let card = NodeCard {
        kind: unit.kind.summary_kind().to_string(),
        title: format!("{}  ➡️", unit.name),
        block_id: None,
        body,
        footer: Some(footer),
    };
    let link = if degraded {
        NodeLink::None
    } else {
        NodeLink::Artifact(unit.artifact.clone())
    };

    Node::card(id, card, degraded || error_count > 0, link)
}

/// Assemble `unit` and summarize it under `summary_id`
///
/// A failure inside the unit is caught here: the summary degrades, the
/// parent keeps going.
fn nested_unit(
    ctx: &AssemblyContext<'_>,
    unit: &UnitScope,
    summary_id: String,
    members: &[FlowEvent],
) -> (Node, usize, Vec<Artifact>) {
    match build_flow_graph(ctx, unit, members) {
        Ok(built) => {
            let node = summary_node(summary_id, unit, members, built.error_count, false);
            let mut artifacts = vec![Artifact {
                name: unit.artifact.clone(),
                graph: built.graph,
            }];
            artifacts.extend(built.artifacts);
            (node, built.error_count, artifacts)
        }
        Err(e) => {
            warn!("Nested unit {} degraded: {}", unit.artifact, e);
            (summary_node(summary_id, unit, members, 1, true), 1, Vec::new())
        }
    }
}

/// Assemble the graph of one unit
///
/// **Public** - recursion entry point, also used directly by tests
///
/// # Arguments
/// * `ctx` - Interaction-wide inputs
/// * `unit` - The unit being assembled; module events of other names in
///   `events` become nested units
/// * `events` - The unit's events, in any order
///
/// # Returns
/// The unit graph with its nodes chained in emission order, the unit's
/// error count and the artifacts of everything nested inside it.
///
/// # Errors
/// * `AssemblyError::EmptyUnit` - `events` is empty
/// * `AssemblyError::NodeText` - an event could not be formatted
pub fn build_flow_graph(
    ctx: &AssemblyContext<'_>,
    unit: &UnitScope,
    events: &[FlowEvent],
) -> Result<FlowGraph, AssemblyError> {
    if events.is_empty() {
        return Err(AssemblyError::EmptyUnit(unit.name.clone()));
    }

    let ordered = time_ordered(events);
    let mut out = FlowGraph::new(Graph::new(unit.artifact.clone()).with_title(unit.name.clone()));
    let mut dedup = Deduplicator::new();
    let mut summarized: HashSet<&str> = HashSet::new();
    let scope = ctx.trace_scope(unit);

    for event in ordered.iter().copied() {
        if is_nested(event, unit) {
            // Later events of a summarized module are already covered
            if !summarized.insert(event.flow_name.as_str()) {
                continue;
            }

            out.push_buckets(dedup.interrupt(), ctx.names);

            let members: Vec<FlowEvent> = ordered
                .iter()
                .filter(|e| e.flow_name == event.flow_name)
                .map(|e| (*e).clone())
                .collect();
            let parent = ctx
                .caller_flow(&event.module_execution_stack)
                .unwrap_or(unit.name.as_str())
                .to_string();
            let nested = UnitScope::module(ctx.interaction_id, &parent, &event.flow_name);

            debug!("Summarizing module {} ({} events)", nested.name, members.len());
            let (node, errors, artifacts) = nested_unit(ctx, &nested, event.node_id(), &members);
            out.error_count += errors;
            out.artifacts.extend(artifacts);
            out.push(node);
            continue;
        }

        let error = is_error(event);
        if error {
            out.error_count += 1;
        }

        if event.module_type.is_omitted() {
            out.push_buckets(dedup.interrupt(), ctx.names);
            continue;
        }

        if event.module_type.is_aggregatable() {
            let closed = dedup.absorb(&event.node_id(), event, error);
            out.push_buckets(closed, ctx.names);
            continue;
        }

        out.push_buckets(dedup.interrupt(), ctx.names);
        out.push(event_node(ctx.names, event, error)?);

        if event.module_type.is_external_invocation() {
            if let Some(detail) = trace_for_invocation(&scope, event, ctx.function_logs) {
                out.error_count += detail.problem_count;
                out.artifacts.push(detail.artifact);
                out.push(detail.node);
            }
        }
    }

    out.push_buckets(dedup.interrupt(), ctx.names);
    Ok(out.finish())
}

/// One maximal run of a single non-module flow
struct Segment {
    key: String,
    flow_name: Option<String>,
    events: Vec<FlowEvent>,
}

/// Cut time-ordered events into flow segments
///
/// Module events stay in whichever segment is open when they run.
fn segment_events(events: &[FlowEvent]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();

    for event in time_ordered(events) {
        let module = is_module_flow(&event.flow_name);
        let starts_new = match segments.last() {
            None => true,
            Some(open) => {
                !module && open.flow_name.as_deref().is_some_and(|name| name != event.flow_name)
            }
        };

        if starts_new {
            segments.push(Segment {
                key: event.node_id(),
                flow_name: None,
                events: Vec::new(),
            });
        }

        if let Some(open) = segments.last_mut() {
            if !module && open.flow_name.is_none() {
                open.flow_name = Some(event.flow_name.clone());
            }
            open.events.push(event.clone());
        }
    }

    segments
}

/// Assemble the top-level graph of one interaction
///
/// **Public** - main entry point for one interaction
///
/// Never fails: a segment that cannot be assembled is shown as a degraded
/// summary node.
pub fn build_interaction_graph(ctx: &AssemblyContext<'_>, events: &[FlowEvent]) -> FlowGraph {
    let ctx = ctx.indexed(events);
    let mut out = FlowGraph::new(Graph::new(ctx.interaction_id));

    let segments = segment_events(events);
    info!(
        "Interaction {}: {} events in {} flow segment(s)",
        ctx.interaction_id,
        events.len(),
        segments.len()
    );

    for segment in segments {
        let flow_name = segment
            .flow_name
            .clone()
            .or_else(|| segment.events.first().map(|e| e.flow_name.clone()))
            .unwrap_or_default();
        let unit = UnitScope::flow(ctx.interaction_id, &segment.key, &flow_name);
        let summary_id = format!("{}_{}", ctx.interaction_id, segment.key);

        let (node, errors, artifacts) = nested_unit(&ctx, &unit, summary_id, &segment.events);
        out.error_count += errors;
        out.artifacts.extend(artifacts);
        out.push(node);
    }

    out.finish()
}
