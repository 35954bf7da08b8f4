//! Graphviz DOT rendering.
//!
//! Layout and drawing stay with Graphviz; this module only serializes the
//! assembled graph model into DOT text with HTML-like table labels.

use crate::graph::{Cluster, Edge, Graph, Node, NodeCard, NodeContent, NodeLink};
use super::writer::artifact_file_name;
use crate::label::sanitize_label;

const ERROR_COLOR: &str = "tomato";
const NORMAL_COLOR: &str = "lightgray";

/// Quote a DOT id or attribute value
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// HTML-like table label of a card: title, block id, body, footer rows
fn card_label(card: &NodeCard) -> String {
    let mut rows = format!(
        "<tr><td bgcolor=\"{}\">{}</td></tr>",
        NORMAL_COLOR,
        sanitize_label(&card.title)
    );
    if let Some(block_id) = &card.block_id {
        rows.push_str(&format!("<tr><td>{}</td></tr>", sanitize_label(block_id)));
    }
    rows.push_str(&format!(
        "<tr><td bgcolor=\"white\">{}</td></tr>",
        sanitize_label(&card.body)
    ));
    if let Some(footer) = &card.footer {
        rows.push_str(&format!("<tr><td>{}</td></tr>", sanitize_label(footer)));
    }

    format!(
        "<<table border=\"0\" cellborder=\"0\" cellspacing=\"0\">{}</table>>",
        rows
    )
}

fn badge_label(caption: &str) -> String {
    format!(
        "<<table border=\"0\" cellborder=\"0\" cellspacing=\"0\"><tr><td bgcolor=\"white\" width=\"100\">{}</td></tr></table>>",
        sanitize_label(caption)
    )
}

fn link_attr(link: &NodeLink) -> Option<String> {
    match link {
        NodeLink::None => None,
        NodeLink::Raw(payload) => Some(format!("URL={}", quote(payload))),
        NodeLink::Artifact(name) => Some(format!("URL={}", quote(&artifact_file_name(name)))),
    }
}

fn node_stmt(node: &Node) -> String {
    let mut attrs = match &node.content {
        NodeContent::Card(card) => vec![
            "shape=plaintext".to_string(),
            "style=\"rounded,filled\"".to_string(),
            format!("color={}", if node.error { ERROR_COLOR } else { NORMAL_COLOR }),
            format!("label={}", card_label(card)),
        ],
        NodeContent::Badge { caption, .. } => vec![
            "shape=plaintext".to_string(),
            format!("label={}", badge_label(caption)),
        ],
        NodeContent::Start(label) => vec!["shape=Mdiamond".to_string(), format!("label={}", quote(label))],
    };
    attrs.extend(link_attr(&node.link));

    format!("{} [{}];", quote(&node.id), attrs.join(" "))
}

fn edge_stmt(edge: &Edge) -> String {
    let (from, to) = if edge.side_ports {
        (format!("{}:e", quote(&edge.from)), format!("{}:w", quote(&edge.to)))
    } else {
        (quote(&edge.from), quote(&edge.to))
    };

    let mut attrs = Vec::new();
    if let Some(label) = &edge.label {
        attrs.push(format!("label={}", quote(label)));
    }
    if let Some(head) = &edge.head_label {
        attrs.push(format!("headlabel={}", quote(head)));
        attrs.push("minlen=2".to_string());
    }
    if let Some(error) = &edge.error_label {
        attrs.push(format!("xlabel={}", quote(error)));
        attrs.push(format!("color={} fontcolor={}", ERROR_COLOR, ERROR_COLOR));
    }
    if edge.undirected {
        attrs.push("dir=none".to_string());
    }

    if attrs.is_empty() {
        format!("{} -> {};", from, to)
    } else {
        format!("{} -> {} [{}];", from, to, attrs.join(" "))
    }
}

/// Statements of a graph body, indented by `indent`
fn body(graph: &Graph, indent: &str, out: &mut String) {
    for node in &graph.nodes {
        out.push_str(&format!("{}{}\n", indent, node_stmt(node)));
    }
    for cluster in &graph.clusters {
        cluster_block(cluster, indent, out);
    }
    for edge in &graph.edges {
        out.push_str(&format!("{}{}\n", indent, edge_stmt(edge)));
    }
    if !graph.rank_group.is_empty() {
        let members: Vec<String> = graph.rank_group.iter().map(|id| quote(id)).collect();
        out.push_str(&format!("{}{{ rank=same; {}; }}\n", indent, members.join("; ")));
    }
}

fn cluster_block(cluster: &Cluster, indent: &str, out: &mut String) {
    let inner = format!("{}  ", indent);
    out.push_str(&format!("{}subgraph {} {{\n", indent, quote(&cluster.id)));
    out.push_str(&format!("{}label={};\n", inner, quote(&cluster.label)));
    body(&cluster.graph, &inner, out);
    out.push_str(&format!("{}}}\n", indent));
}

/// Render a graph as a DOT digraph
///
/// **Public** - used by the artifact writer
pub fn render_dot(graph: &Graph) -> String {
    let mut out = format!("digraph {} {{\n", quote(&graph.name));
    out.push_str("  rankdir=LR;\n  nodesep=0.5;\n  ranksep=0.5;\n  forcelabels=true;\n");
    if let Some(title) = &graph.title {
        out.push_str(&format!("  label={};\n  labelloc=t;\n  fontsize=24;\n", quote(title)));
    }
    body(graph, "  ", &mut out);
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(title: &str, body: &str) -> NodeCard {
        NodeCard {
            kind: "PlayPrompt".into(),
            title: title.into(),
            block_id: Some("Greeting".into()),
            body: body.into(),
            footer: Some("Results : true ✅".into()),
        }
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c\nd"), "\"a\\\"b\\\\c\\nd\"");
    }

    #[test]
    fn test_card_label_escapes_markup() {
        let label = card_label(&card("Prompt", "a < b\nc"));
        assert!(label.contains("a &lt; b<br/>c"));
        assert!(label.contains("<tr><td>Greeting</td></tr>"));
        assert!(label.starts_with("<<table"));
        assert!(label.ends_with("</table>>"));
    }

    #[test]
    fn test_error_node_color_and_link() {
        let node = Node::card("n1", card("Prompt", "x"), true, NodeLink::Artifact("module_c-1__Main__MOD_A".into()));
        let stmt = node_stmt(&node);
        assert!(stmt.starts_with("\"n1\" ["));
        assert!(stmt.contains("color=tomato"));
        assert!(stmt.contains("URL=\"module_c-1__Main__MOD_A.dot\""));
    }

    #[test]
    fn test_artifact_link_uses_written_file_name() {
        let node = Node::card("n1", card("Sales", "x"), false, NodeLink::Artifact("flow_c-1_k__Sales/Inbound".into()));
        assert!(node_stmt(&node).contains("URL=\"flow_c-1_k__Sales_Inbound.dot\""));
    }

    #[test]
    fn test_edge_statements() {
        assert_eq!(edge_stmt(&Edge::new("a", "b").with_label("0")), "\"a\" -> \"b\" [label=\"0\"];");
        assert_eq!(
            edge_stmt(&Edge::new("a", "b").with_label("Related").undirected()),
            "\"a\" -> \"b\" [label=\"Related\" dir=none];"
        );

        let trace_edge = Edge {
            head_label: Some("GET\nhealth".into()),
            error_label: Some("500".into()),
            side_ports: true,
            ..Edge::new("root", "api")
        };
        let stmt = edge_stmt(&trace_edge);
        assert!(stmt.starts_with("\"root\":e -> \"api\":w"));
        assert!(stmt.contains("headlabel=\"GET\\nhealth\""));
        assert!(stmt.contains("xlabel=\"500\" color=tomato"));
    }

    #[test]
    fn test_render_with_cluster_and_rank() {
        let mut inner = Graph::new("c-1");
        inner.add_node(Node::badge("c-1_attributes", "SetAttributes", "Attributes", NodeLink::None));
        inner.rank_group = vec!["c-1_attributes".into()];

        let mut graph = Graph::new("contact_flow").with_title("Flows");
        graph.add_node(Node {
            id: "start".into(),
            content: NodeContent::Start("Start".into()),
            error: false,
            link: NodeLink::None,
        });
        graph.clusters.push(Cluster {
            id: "cluster_c-1".into(),
            label: "Contact Id : c-1".into(),
            graph: inner,
        });

        let dot = render_dot(&graph);
        assert!(dot.starts_with("digraph \"contact_flow\" {\n"));
        assert!(dot.contains("\"start\" [shape=Mdiamond label=\"Start\"];"));
        assert!(dot.contains("  subgraph \"cluster_c-1\" {\n    label=\"Contact Id : c-1\";"));
        assert!(dot.contains("{ rank=same; \"c-1_attributes\"; }"));
        assert!(dot.ends_with("}\n"));
    }
}
