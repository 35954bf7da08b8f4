//! Multi-interaction composition.
//!
//! Related interactions (transfers, continuations, associated children) are
//! laid out as one cluster each inside a single top-level graph, linked
//! from a synthetic start node and to each other.

use super::assembler::FlowGraph;
use super::model::{Artifact, Cluster, Edge, Graph, Node, NodeContent, NodeLink};
use crate::label::attribute_assignments;
use crate::parser::{ContactSummary, FlowEvent};
use crate::utils::config::TOP_LEVEL_GRAPH_NAME;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Id of the synthetic entry node
pub const START_NODE_ID: &str = "start";

/// One row of an interaction's attribute table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEntry {
    pub key: String,
    /// Compact JSON of the value, compared verbatim across interactions
    pub value: String,
    /// Flow whose block set the attribute
    pub source_flow: Option<String>,
    pub block_identifier: Option<String>,
    /// Provenance taken from a sibling interaction
    #[serde(default)]
    pub borrowed: bool,
}

impl AttributeEntry {
    fn has_provenance(&self) -> bool {
        self.source_flow.is_some() && self.block_identifier.is_some()
    }
}

/// Attribute table of one interaction with provenance from its own log
///
/// An attribute's setter is the first attribute-set event assigning its key.
pub fn attribute_table(attributes: &IndexMap<String, Value>, events: &[FlowEvent]) -> Vec<AttributeEntry> {
    attributes
        .iter()
        .map(|(key, value)| {
            let setter = events.iter().find(|event| {
                event.module_type.is_attribute_set()
                    && attribute_assignments(&event.parameters)
                        .iter()
                        .any(|(assigned, _)| assigned == key)
            });

            AttributeEntry {
                key: key.clone(),
                value: value.to_string(),
                source_flow: setter.map(|e| e.flow_name.clone()),
                block_identifier: setter.and_then(|e| e.block_identifier.clone()),
                borrowed: false,
            }
        })
        .collect()
}

/// Borrow provenance across interactions sharing a key and value
///
/// Works on a snapshot: only provenance an interaction found in its own log
/// is lent out, and values are never changed. Returns an annotated copy.
pub fn resolve_attribute_provenance(
    tables: &IndexMap<String, Vec<AttributeEntry>>,
) -> IndexMap<String, Vec<AttributeEntry>> {
    tables
        .iter()
        .map(|(interaction, entries)| {
            let resolved = entries
                .iter()
                .map(|entry| {
                    if entry.has_provenance() {
                        return entry.clone();
                    }

                    let lender = tables
                        .iter()
                        .filter(|(other, _)| *other != interaction)
                        .flat_map(|(_, others)| others.iter())
                        .find(|other| {
                            other.has_provenance() && other.key == entry.key && other.value == entry.value
                        });

                    match lender {
                        Some(lender) => {
                            debug!("Attribute {} of {} set elsewhere", entry.key, interaction);
                            AttributeEntry {
                                source_flow: lender.source_flow.clone(),
                                block_identifier: lender.block_identifier.clone(),
                                borrowed: true,
                                ..entry.clone()
                            }
                        }
                        None => entry.clone(),
                    }
                })
                .collect();
            (interaction.clone(), resolved)
        })
        .collect()
}

/// Everything assembled for one interaction
#[derive(Debug, Clone, Default)]
pub struct InteractionOutcome {
    pub summary: ContactSummary,
    /// Top-level flow graph of the interaction
    pub flow: FlowGraph,
    /// Transcript link nodes added to the interaction's cluster
    pub link_nodes: Vec<Node>,
    /// Transcript artifacts and the traces hanging off them
    pub artifacts: Vec<Artifact>,
    pub attributes: Vec<AttributeEntry>,
    /// The interaction's logs could not be loaded
    pub failed: bool,
}

impl InteractionOutcome {
    /// Outcome of an interaction that could not be assembled at all
    pub fn failed(summary: ContactSummary) -> Self {
        let flow = FlowGraph {
            graph: Graph::new(summary.contact_id.clone()),
            ..Default::default()
        };
        Self {
            summary,
            flow,
            failed: true,
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.summary.contact_id
    }

    /// Names of every artifact this interaction produced
    pub fn artifact_names(&self) -> Vec<String> {
        self.flow
            .artifacts
            .iter()
            .chain(self.artifacts.iter())
            .map(|a| a.name.clone())
            .collect()
    }
}

/// Composed top-level graph plus every artifact behind it
#[derive(Debug, Clone)]
pub struct Composition {
    pub graph: Graph,
    pub artifacts: Vec<Artifact>,
}

/// Edges linking interactions to the start node and to each other
///
/// An interaction without a predecessor, or with a related interaction, is
/// a root and hangs off the start node. A related interaction links
/// undirected from the related one's last node; otherwise a predecessor
/// links from its last node. Links to interactions without nodes, or not
/// part of `outcomes`, are left out.
pub fn link_interactions(outcomes: &[InteractionOutcome]) -> Vec<Edge> {
    let by_id: IndexMap<&str, &InteractionOutcome> = outcomes.iter().map(|o| (o.id(), o)).collect();
    let mut links = Vec::new();
    let mut roots = Vec::new();

    for outcome in outcomes {
        let summary = &outcome.summary;
        let related = summary.related_contact_id.as_deref().filter(|id| !id.is_empty());
        let previous = summary.previous_contact_id.as_deref().filter(|id| !id.is_empty());

        if previous.is_none() || related.is_some() {
            roots.push(outcome);
        }

        let Some(first) = outcome.flow.first_node() else {
            debug!("Interaction {} has no nodes; not linked", outcome.id());
            continue;
        };

        let last_of = |id: Option<&str>| {
            id.and_then(|id| by_id.get(id))
                .and_then(|other| other.flow.last_node())
        };

        if related.is_some() {
            if let Some(last) = last_of(related) {
                links.push(Edge::new(last, first).with_label("Related").undirected());
            }
        } else if let Some(last) = last_of(previous) {
            links.push(Edge::new(last, first).with_label(summary.initiation_method.clone()));
        }
    }

    let mut edges: Vec<Edge> = roots
        .into_iter()
        .filter_map(|root| {
            root.flow
                .first_node()
                .map(|first| Edge::new(START_NODE_ID, first).with_label(root.summary.initiation_method.clone()))
        })
        .collect();
    edges.extend(links);
    edges
}

fn cluster_label(summary: &ContactSummary, selected: bool) -> String {
    let marker = if selected { " ✅" } else { "" };
    format!(
        "Contact Id : {}{} \nChannel : {}",
        summary.contact_id, marker, summary.channel
    )
}

fn attributes_node(interaction_id: &str, entries: &[AttributeEntry]) -> Node {
    Node::badge(
        format!("{}_attributes", interaction_id),
        "SetAttributes",
        "Attributes",
        NodeLink::Raw(serde_json::to_string_pretty(entries).unwrap_or_default()),
    )
}

/// Compose every interaction into the top-level graph
///
/// **Public** - last step of a render
///
/// # Arguments
/// * `selected` - Interaction the render was asked for; its cluster is marked
/// * `outcomes` - Assembled interactions, in directory order
pub fn compose(selected: &str, outcomes: Vec<InteractionOutcome>) -> Composition {
    let tables: IndexMap<String, Vec<AttributeEntry>> = outcomes
        .iter()
        .map(|o| (o.id().to_string(), o.attributes.clone()))
        .collect();
    let resolved = resolve_attribute_provenance(&tables);

    let mut graph = Graph::new(TOP_LEVEL_GRAPH_NAME);
    graph.add_node(Node {
        id: START_NODE_ID.to_string(),
        content: NodeContent::Start("Start".to_string()),
        error: false,
        link: NodeLink::None,
    });
    graph.edges = link_interactions(&outcomes);

    let mut artifacts = Vec::new();
    for outcome in outcomes {
        let id = outcome.summary.contact_id.clone();
        let mut cluster_graph = outcome.flow.graph;

        for node in outcome.link_nodes {
            cluster_graph.add_node(node);
        }
        if !outcome.failed {
            let entries = resolved.get(&id).map(Vec::as_slice).unwrap_or_default();
            cluster_graph.add_node(attributes_node(&id, entries));
        }

        graph.clusters.push(Cluster {
            id: format!("cluster_{}", id),
            label: cluster_label(&outcome.summary, id == selected),
            graph: cluster_graph,
        });

        artifacts.extend(outcome.flow.artifacts);
        artifacts.extend(outcome.artifacts);
    }

    info!(
        "Composed {} interaction(s), {} artifact(s)",
        graph.clusters.len(),
        artifacts.len()
    );

    Composition { graph, artifacts }
}
