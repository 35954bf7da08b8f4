//! Node/edge graph model handed to the renderer.

use log::warn;
use std::collections::HashSet;

/// Structured label of a regular node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeCard {
    /// Module kind, used for styling
    pub kind: String,
    pub title: String,
    /// Human block label (hidden for UUID identifiers)
    pub block_id: Option<String>,
    pub body: String,
    pub footer: Option<String>,
}

/// What a node shows
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Card(NodeCard),
    /// Small captioned node: trace segments and link nodes
    Badge { kind: String, caption: String },
    /// Synthetic entry point of the composed graph
    Start(String),
}

/// Where a node points when clicked
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeLink {
    #[default]
    None,
    /// Raw payload dump
    Raw(String),
    /// Name of a nested artifact
    Artifact(String),
}

/// A rendered unit
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub content: NodeContent,
    /// Error-colored when set
    pub error: bool,
    pub link: NodeLink,
}

impl Node {
    pub fn card(id: impl Into<String>, card: NodeCard, error: bool, link: NodeLink) -> Self {
        Self {
            id: id.into(),
            content: NodeContent::Card(card),
            error,
            link,
        }
    }

    pub fn badge(id: impl Into<String>, kind: impl Into<String>, caption: impl Into<String>, link: NodeLink) -> Self {
        Self {
            id: id.into(),
            content: NodeContent::Badge {
                kind: kind.into(),
                caption: caption.into(),
            },
            error: false,
            link,
        }
    }

    /// Footer text, if this node is a card with one
    pub fn footer(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Card(card) => card.footer.as_deref(),
            _ => None,
        }
    }

    pub fn title(&self) -> &str {
        match &self.content {
            NodeContent::Card(card) => &card.title,
            NodeContent::Badge { caption, .. } => caption,
            NodeContent::Start(label) => label,
        }
    }
}

/// Directed (or undirected) connection between two nodes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    /// Label drawn at the head end (trace segment edges)
    pub head_label: Option<String>,
    /// Failure annotation; error-colors the edge
    pub error_label: Option<String>,
    pub undirected: bool,
    /// Leave from the east side, enter from the west side
    pub side_ports: bool,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn undirected(mut self) -> Self {
        self.undirected = true;
        self
    }
}

/// A per-interaction cluster of the composed graph
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: String,
    pub label: String,
    pub graph: Graph,
}

/// Node/edge collection for one render
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Graph {
    pub name: String,
    pub title: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Nodes constrained to the same visual rank
    pub rank_group: Vec<String>,
    pub clusters: Vec<Cluster>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a node; a second node with an existing id is rejected
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.contains(&node.id) {
            warn!("Duplicate node id '{}' in graph '{}' ignored", node.id, self.name);
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
            || self.clusters.iter().any(|c| c.graph.contains(id))
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .or_else(|| self.clusters.iter().find_map(|c| c.graph.node(id)))
    }

    /// Connect `order` as a chain and rank-group it
    pub fn chain(mut self, order: &[String]) -> Self {
        self.edges.extend(sequence_edges(order));
        self.rank_group = order.to_vec();
        self
    }
}

/// Consecutive pairs of `order`, labeled by position
///
/// A pair that was already added is not added again.
pub fn sequence_edges(order: &[String]) -> Vec<Edge> {
    let mut seen = HashSet::new();
    order
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| seen.insert((pair[0].clone(), pair[1].clone())))
        .map(|(i, pair)| Edge::new(pair[0].clone(), pair[1].clone()).with_label(i.to_string()))
        .collect()
}

/// An independently addressable sub-graph
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Stable name, `{unit-kind}_{interactionId}_{unit-stack}` style
    pub name: String,
    pub graph: Graph,
}
