use std::path::PathBuf;

use crate::utils::config::DEFAULT_REGION;

/// Arguments for the render command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct RenderArgs {
    /// Directory of collected logs
    pub input: PathBuf,

    /// Interaction the render is asked for
    pub contact_id: String,

    /// Directory receiving DOT files and the render report
    pub output_dir: PathBuf,

    /// Region passed to the trace store
    pub region: String,

    /// HTTP trace gateway (None = read trace batches from the input bundle)
    pub trace_endpoint: Option<String>,

    /// Display-name file for module types (optional)
    pub names_file: Option<PathBuf>,

    /// Assemble only the selected interaction
    pub single: bool,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for RenderArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            contact_id: String::new(),
            output_dir: PathBuf::from("out"),
            region: DEFAULT_REGION.to_string(),
            trace_endpoint: None,
            names_file: None,
            single: false,
            print_summary: false,
        }
    }
}
