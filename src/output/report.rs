//! Render report output.
//!
//! A small JSON summary of one render: which interactions were assembled,
//! how many nodes and errors each produced and which artifacts back them.

use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Per-interaction line of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactReport {
    pub contact_id: String,
    pub channel: String,
    /// Top-level nodes (flow segments) of the interaction
    pub nodes: usize,
    pub error_count: usize,
    pub artifacts: Vec<String>,
    /// Logs could not be loaded; the cluster is empty
    #[serde(default)]
    pub failed: bool,
}

/// Summary of one render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderReport {
    pub version: String,
    pub selected_contact: String,
    pub contacts: Vec<ContactReport>,
    pub generated_at: String,
}

impl RenderReport {
    /// New report stamped with the current schema version and time
    pub fn new(selected_contact: impl Into<String>, contacts: Vec<ContactReport>) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            selected_contact: selected_contact.into(),
            contacts,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn total_errors(&self) -> usize {
        self.contacts.iter().map(|c| c.error_count).sum()
    }

    pub fn total_artifacts(&self) -> usize {
        self.contacts.iter().map(|c| c.artifacts.len()).sum()
    }
}

/// Write a render report to a JSON file
///
/// **Public** - main entry point for report output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(report: &RenderReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing render report to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    info!(
        "Render report written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a render report from a JSON file
///
/// **Public** - used by the validate command and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_report(input_path: impl AsRef<Path>) -> Result<RenderReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading render report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: RenderReport =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Render report loaded: version {}, contact {}",
        report.version, report.selected_contact
    );

    Ok(report)
}
