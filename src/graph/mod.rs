//! Graph assembly.
//!
//! This module transforms typed event records into:
//! - One flow graph per interaction, with nested sub-graphs per flow segment
//!   and reusable module
//! - Transcript graphs for call recordings and assistant conversations
//! - One composed top-level graph linking related interactions

pub mod assembler;
pub mod composer;
pub mod model;
pub mod transcript;

// Re-export main types and functions
pub use assembler::{build_flow_graph, build_interaction_graph, AssemblyContext, FlowGraph, UnitScope};
pub use composer::{attribute_table, compose, link_interactions, resolve_attribute_provenance, AttributeEntry, Composition, InteractionOutcome};
pub use transcript::{conversation_artifacts, lex_graph, lex_hook_graph, transcript_graph};
pub use model::{sequence_edges, Artifact, Cluster, Edge, Graph, Node, NodeCard, NodeContent, NodeLink};
