//! Output writers for assembled graphs.
//!
//! This module handles writing render results to disk:
//! - DOT text for the top-level graph and every nested artifact
//! - A JSON render report

pub mod dot;
pub mod report;
pub mod writer;

// Re-export main functions
pub use dot::render_dot;
pub use report::{read_report, write_report, ContactReport, RenderReport};
pub use writer::{artifact_file_name, write_artifacts, write_dot};
