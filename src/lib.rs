//! Flowtrace Studio
//!
//! Execution graph reconstruction for contact-center interactions.
//!
//! The engine correlates flow event records, function invocation logs,
//! distributed-trace segments and conversation transcripts of one
//! interaction (and the interactions related to it), and turns them into
//! a hierarchy of Graphviz DOT graphs:
//!
//! - a top-level graph with one cluster per interaction
//! - one nested graph per flow segment and per reusable module
//! - one trace graph per correlated function invocation
//! - transcript graphs for call recordings and assistant conversations
//!
//! This crate provides the core implementation for the `flowtrace` CLI.
//!
//! ## Getting Started
//!
//! ```bash
//! flowtrace render --input ./bundle --contact <CONTACT_ID> --output ./out
//! dot -Tsvg out/contact_flow.dot -o contact_flow.svg
//! ```

pub mod aggregator;
pub mod commands;
pub mod correlator;
pub mod graph;
pub mod label;
pub mod output;
pub mod parser;
pub mod store;
pub mod utils;
