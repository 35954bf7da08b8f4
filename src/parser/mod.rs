//! Input record parsing.
//!
//! This module handles:
//! - Typed event records, invocation log entries and trace segments
//! - Module type tagging for event records
//! - Reading an already-collected input bundle from disk

pub mod bundle;
pub mod module_type;
pub mod records;

// Re-export main types
pub use bundle::{InputBundle, InteractionInput};
pub use module_type::ModuleType;
pub use records::{
    parse_flow_events, parse_timestamp, ContactSummary, FlowEvent, FunctionLogEntry, FunctionLogs,
    LexTurn, LogLevel, Parameters, ResultText, TraceSegment, TranscriptSegment,
};
