//! Text and label formatting.
//!
//! Pure functions that turn event payloads into bounded, human-readable
//! node text: wrapping, markup escaping, resource-name redaction and the
//! per-module-type body/footer layout.

pub mod identifier;
pub mod names;
pub mod node_text;
pub mod params;
pub mod wrap;

// Re-export main functions
pub use identifier::{check_block_identifier, displayable_block_id, redact_arns};
pub use names::DisplayNames;
pub use node_text::{aggregate_text, decorate_footer, display_kind, node_text, Footer, NodeText};
pub use params::{attribute_assignments, invocation_arguments, ModuleParams};
pub use wrap::{display_value, sanitize_label, wrap, wrap_transcript};
