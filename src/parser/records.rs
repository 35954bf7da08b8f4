//! Typed input records.
//!
//! Raw JSON from the log collaborators is converted into these types once,
//! at the input boundary. Every record keeps its raw payload so rendered
//! nodes can link back to exactly what was logged.

use super::module_type::ModuleType;
use crate::utils::error::ParseError;
use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// Ordered parameter mapping of a flow block
pub type Parameters = IndexMap<String, Value>;

/// Invocation log entries grouped by function name
pub type FunctionLogs = IndexMap<String, Vec<FunctionLogEntry>>;

/// Parse an ISO-8601 timestamp, with or without an explicit offset
///
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ParseError::InvalidTimestamp(raw.to_string()))
}

/// Result text of a flow block: free text or a structured map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultText {
    Text(String),
    Structured(Value),
}

impl ResultText {
    /// Plain string view used for keyword matching and footers
    pub fn as_plain(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text.as_str()),
            Self::Structured(value) => Cow::Owned(value.to_string()),
        }
    }
}

/// Wire shape of one event record
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawFlowEvent {
    timestamp: String,
    #[serde(default)]
    contact_id: String,
    #[serde(default)]
    contact_flow_id: Option<String>,
    #[serde(default)]
    contact_flow_name: String,
    #[serde(default)]
    contact_flow_module_type: String,
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    results: Option<ResultText>,
    #[serde(default)]
    external_results: Option<Value>,
    #[serde(default)]
    result_data: Option<Value>,
    #[serde(default)]
    module_execution_stack: Vec<Value>,
}

/// One execution step of an interaction's flow
#[derive(Debug, Clone)]
pub struct FlowEvent {
    /// Position in the interaction's input log; ties on timestamp keep this order
    pub ordinal: usize,
    pub timestamp: DateTime<Utc>,
    pub interaction_id: String,
    pub flow_id: Option<String>,
    pub flow_name: String,
    pub module_type: ModuleType,
    pub block_identifier: Option<String>,
    pub parameters: Parameters,
    pub result: Option<ResultText>,
    pub external_results: Option<Value>,
    pub result_data: Option<Value>,
    pub module_execution_stack: Vec<String>,
    pub raw: Value,
}

impl FlowEvent {
    /// Build an event from its raw JSON record
    pub fn from_value(value: Value, ordinal: usize) -> Result<Self, ParseError> {
        let raw: RawFlowEvent = serde_json::from_value(value.clone())?;
        let timestamp = parse_timestamp(&raw.timestamp)?;

        let parameters = match raw.parameters {
            Some(Value::Object(map)) => map.into_iter().collect(),
            Some(Value::Null) | None => Parameters::new(),
            Some(other) => {
                debug!("Non-object parameters on record {}: {}", ordinal, other);
                Parameters::new()
            }
        };

        let module_execution_stack = raw
            .module_execution_stack
            .into_iter()
            .map(|entry| match entry {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();

        Ok(Self {
            ordinal,
            timestamp,
            interaction_id: raw.contact_id,
            flow_id: raw.contact_flow_id,
            flow_name: raw.contact_flow_name,
            module_type: ModuleType::from(raw.contact_flow_module_type.as_str()),
            block_identifier: raw.identifier,
            parameters,
            result: raw.results,
            external_results: raw.external_results,
            result_data: raw.result_data,
            module_execution_stack,
            raw: value,
        })
    }

    /// Compact timestamp + ordinal, unique within one interaction
    pub fn node_id(&self) -> String {
        format!("{}_{}", compact_timestamp(&self.timestamp), self.ordinal)
    }

    /// Result text as a plain string (empty when absent)
    pub fn result_text(&self) -> Cow<'_, str> {
        self.result
            .as_ref()
            .map(ResultText::as_plain)
            .unwrap_or(Cow::Borrowed(""))
    }
}

/// Timestamp with separators stripped, usable inside node ids
pub fn compact_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace([':', '.'], "")
}

/// Parse an array of raw event records
///
/// Malformed records are logged and skipped; an input where every record
/// fails is rejected.
pub fn parse_flow_events(records: &[Value]) -> Result<Vec<FlowEvent>, ParseError> {
    let mut events = Vec::with_capacity(records.len());

    for (ordinal, record) in records.iter().enumerate() {
        match FlowEvent::from_value(record.clone(), ordinal) {
            Ok(event) => events.push(event),
            Err(e) => {
                // Log but don't fail - some records may be malformed
                warn!("Failed to parse event record {}: {}", ordinal, e);
            }
        }
    }

    if events.is_empty() && !records.is_empty() {
        return Err(ParseError::InvalidFormat(
            "All event records failed to parse".to_string(),
        ));
    }

    Ok(events)
}

/// Severity of an invocation log entry
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
    Other(String),
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "INFO" => Self::Info,
            "WARN" | "WARNING" => Self::Warn,
            "ERROR" => Self::Error,
            _ => Self::Other(s),
        }
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Other(s) => s,
        }
    }

    pub fn is_problem(&self) -> bool {
        matches!(self, Self::Warn | Self::Error)
    }
}

#[derive(Debug, Deserialize)]
struct RawFunctionLogEntry {
    #[serde(default, rename = "ContactId")]
    contact_id: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    attributes: Option<Value>,
    #[serde(default)]
    event: Option<Value>,
    #[serde(default)]
    intent: Option<Value>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default, alias = "traceId")]
    xray_trace_id: Option<String>,
}

/// One log line emitted by an invoked function
#[derive(Debug, Clone)]
pub struct FunctionLogEntry {
    pub interaction_id: Option<String>,
    pub level: LogLevel,
    pub message: String,
    pub parameters: Option<Value>,
    pub attributes: Option<Value>,
    pub event: Option<Value>,
    pub intent: Option<Value>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Timestamp exactly as logged, kept for node ids
    pub raw_timestamp: String,
    pub trace_id: Option<String>,
    pub raw: Value,
}

impl FunctionLogEntry {
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        let raw: RawFunctionLogEntry = serde_json::from_value(value.clone())?;

        let raw_timestamp = raw.timestamp.unwrap_or_default();
        let timestamp = match parse_timestamp(&raw_timestamp) {
            Ok(ts) => Some(ts),
            Err(e) => {
                debug!("Invocation log entry without usable timestamp: {}", e);
                None
            }
        };

        Ok(Self {
            interaction_id: raw.contact_id,
            level: raw.level.map(LogLevel::from).unwrap_or_default(),
            message: raw.message,
            parameters: raw.parameters,
            attributes: raw.attributes,
            event: raw.event,
            intent: raw.intent,
            timestamp,
            raw_timestamp,
            trace_id: raw.xray_trace_id,
            raw: value,
        })
    }

    /// Parse an array of raw entries, skipping malformed ones
    pub fn parse_all(records: &[Value]) -> Vec<Self> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| match Self::from_value(record.clone()) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Failed to parse invocation log entry {}: {}", index, e);
                    None
                }
            })
            .collect()
    }

    /// `event.inputTranscript`, set on assistant hook invocations
    pub fn input_transcript(&self) -> Option<&str> {
        self.event
            .as_ref()
            .and_then(|e| e.get("inputTranscript"))
            .and_then(Value::as_str)
    }
}

/// Service annotations of a trace segment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpRequest {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpResponse {
    #[serde(default)]
    pub status: Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<HttpRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<HttpResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CauseException {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cause {
    #[serde(default)]
    pub exceptions: Vec<CauseException>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A node of a distributed-trace tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceSegment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsegments: Vec<TraceSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Cause>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Interaction metadata from the contact directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactSummary {
    pub contact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_contact_id: Option<String>,
    #[serde(default)]
    pub initiation_method: String,
    #[serde(default)]
    pub channel: String,
}

/// One utterance of a call-recording transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TranscriptSegment {
    pub id: String,
    #[serde(default)]
    pub participant_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub begin_offset_millis: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpretation {
    #[serde(default)]
    pub intent: IntentRef,
    #[serde(default)]
    pub nlu_confidence: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    pub intent: Option<IntentRef>,
    #[serde(default)]
    pub session_attributes: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: String,
}

/// One turn of a conversational-assistant transcript
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexTurn {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub input_transcript: String,
    #[serde(default)]
    pub interpretations: Vec<Interpretation>,
    #[serde(default)]
    pub session_state: SessionState,
    #[serde(default)]
    pub messages: Vec<AssistantMessage>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
