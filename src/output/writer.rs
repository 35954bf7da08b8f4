//! DOT artifact writer.
//!
//! Writes the top-level graph and every nested artifact next to each other
//! so the `URL` links between them resolve as relative paths.

use super::dot::render_dot;
use crate::graph::{Artifact, Graph};
use crate::utils::config::TOP_LEVEL_GRAPH_NAME;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write one graph as DOT text
///
/// **Public** - main entry point for DOT output
///
/// # Arguments
/// * `graph` - Graph to render
/// * `output_path` - Path to the output `.dot` file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::InvalidPath` - Path is empty, a directory, or its parent cannot be created
pub fn write_dot(graph: &Graph, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    debug!("Writing DOT to: {}", output_path.display());

    // Validate path
    validate_dot_path(output_path)?;

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    let content = render_dot(graph);

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(content.as_bytes())
        .map_err(OutputError::WriteFailed)?;
    writer.flush().map_err(OutputError::WriteFailed)?;

    debug!("DOT written ({} bytes)", content.len());
    Ok(())
}

/// File name of an artifact; path separators are replaced
pub fn artifact_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{}.dot", safe)
}

/// Write the top-level graph and every artifact under `output_dir`
///
/// Artifacts sharing a name (one trace reached from two places) are
/// written once.
///
/// # Returns
/// Paths of the files written, top-level graph first
pub fn write_artifacts(
    top_level: &Graph,
    artifacts: &[Artifact],
    output_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, OutputError> {
    let output_dir = output_dir.as_ref();
    let mut written = Vec::with_capacity(artifacts.len() + 1);

    let top_path = output_dir.join(artifact_file_name(TOP_LEVEL_GRAPH_NAME));
    write_dot(top_level, &top_path)?;
    written.push(top_path);

    let mut seen = HashSet::new();
    for artifact in artifacts {
        if !seen.insert(artifact.name.as_str()) {
            debug!("Artifact {} already written", artifact.name);
            continue;
        }
        let path = output_dir.join(artifact_file_name(&artifact.name));
        write_dot(&artifact.graph, &path)?;
        written.push(path);
    }

    info!("Wrote {} DOT file(s) to {}", written.len(), output_dir.display());
    Ok(written)
}

/// Validate output path for DOT files
///
/// **Private** - internal validation
fn validate_dot_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    if let Some(ext) = path.extension() {
        if ext != "dot" {
            debug!("Warning: File does not have .dot extension: {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Node, NodeLink};

    fn graph(name: &str) -> Graph {
        let mut graph = Graph::new(name);
        graph.add_node(Node::badge("n", "Lex", "Lex", NodeLink::None));
        graph
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/graph.dot");

        write_dot(&graph("g"), &nested_path).unwrap();

        let content = std::fs::read_to_string(&nested_path).unwrap();
        assert!(content.starts_with("digraph \"g\""));
    }

    #[test]
    fn test_validate_dot_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_dot_path(temp_dir.path()).is_err());
        assert!(validate_dot_path(Path::new("")).is_err());
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(artifact_file_name("flow_c-1_k__Main/Sub"), "flow_c-1_k__Main_Sub.dot");
    }

    #[test]
    fn test_write_artifacts_skips_duplicates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let artifacts = vec![
            Artifact { name: "xray_trace_c-1__1-a".into(), graph: graph("a") },
            Artifact { name: "xray_trace_c-1__1-a".into(), graph: graph("a") },
            Artifact { name: "transcript_c-1".into(), graph: graph("t") },
        ];

        let written = write_artifacts(&graph("top"), &artifacts, temp_dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert!(temp_dir.path().join("contact_flow.dot").exists());
        assert!(temp_dir.path().join("transcript_c-1.dot").exists());
    }
}
