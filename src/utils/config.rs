//! Configuration and constants for the CLI.

use std::time::Duration;

/// Default timeout for trace store requests
pub const DEFAULT_TRACE_TIMEOUT: Duration = Duration::from_secs(30);

/// Current render report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default region when none is supplied
pub const DEFAULT_REGION: &str = "ap-northeast-2";

/// Substrings of a result text that mark the event as a failure (case-sensitive)
pub const ERROR_KEYWORDS: &[&str] = &[
    "Error",
    "Failed",
    "Timeout",
    "Exception",
    "No prompt provided",
    "Instance has reached concurrent Lambda thread access limit",
    "Unsupported",
    "Invalid",
    "not found",
    "NotDone",
    "MultipleFound",
    "The Lambda Function Returned An Error.",
];

/// Module types whose consecutive runs collapse into one node
pub const AGGREGATABLE_MODULE_TYPES: &[&str] = &["SetAttributes", "SetFlowAttributes"];

/// Module types that never produce a node
pub const OMITTED_MODULE_TYPES: &[&str] = &["InvokeFlowModule"];

/// Flow names containing this marker are reusable modules
pub const MODULE_FLOW_MARKER: &str = "MOD_";

/// Trace subsegments with no diagnostic value
pub const SKIPPED_SEGMENT_NAMES: &[&str] =
    &["Overhead", "Dwell Time", "Lambda", "QueueTime", "Initialization"];

/// Services whose edge label shows operation + resource
pub const RESOURCE_LABELED_SERVICES: &[&str] = &["SSM", "Connect", "SecretsManager", "SQS", "S3"];

/// Parameter-name collision neutralized before payload comparison
pub const PARAMETER_COLLISION: (&str, &str) = ("id&v", "idnv");

/// Configuration sub-key that legitimately differs between flow and function payloads
pub const VOLATILE_CONFIG_KEY: &str = "varsConfig";

// Wrap widths used by the node text formatter
pub const NODE_TEXT_WIDTH: usize = 100;
pub const PARAMETER_LINE_WIDTH: usize = 25;
pub const ATTRIBUTE_LINE_WIDTH: usize = 30;
pub const COMPARISON_VALUE_WIDTH: usize = 50;
pub const COMPARISON_INLINE_LIMIT: usize = 30;
pub const PROMPT_LINE_WIDTH: usize = 30;
pub const PROMPT_RESULT_WIDTH: usize = 20;
pub const FOOTER_WIDTH: usize = 30;
pub const TRANSCRIPT_WIDTH: usize = 40;

/// Output file name of the top-level graph
pub const TOP_LEVEL_GRAPH_NAME: &str = "contact_flow";

/// Output file name of the render report
pub const REPORT_FILE_NAME: &str = "render_report.json";

/// Display kind and default title of spliced trace nodes
pub const TRACE_NODE_KIND: &str = "xray";
pub const TRACE_NODE_TITLE: &str = "Lambda trace";

/// Width of one `key : value` line in invocation log nodes
pub const LOG_LINE_WIDTH: usize = 25;
