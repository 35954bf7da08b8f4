//! Invocation-to-log matching.
//!
//! Invocation logs carry no back-reference to the flow event that triggered
//! them. A log entry is taken to describe the same call when it belongs to
//! the same interaction and logged exactly the arguments the flow passed;
//! among several such entries the one closest in time wins.

use crate::label::invocation_arguments;
use crate::parser::{FlowEvent, FunctionLogEntry};
use crate::utils::config::{PARAMETER_COLLISION, VOLATILE_CONFIG_KEY};
use log::{debug, warn};
use serde_json::{Map, Value};

/// Trace id chosen for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceMatch {
    pub trace_id: String,
    /// Number of log entries whose payload matched
    pub candidates: usize,
}

/// Which payload of a log entry describes the call arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadKind {
    /// `parameters` logged by the function itself
    Parameter,
    /// `event.Details.Parameters` of the raw invocation event
    Event,
}

impl PayloadKind {
    fn of(entry: &FunctionLogEntry) -> Option<Self> {
        if entry.message.contains("parameter") {
            Some(Self::Parameter)
        } else if entry.message.contains("Event") {
            Some(Self::Event)
        } else {
            None
        }
    }
}

/// Key-sorted compact JSON with the known name collision neutralized
pub fn normalize_payload(value: &Value) -> String {
    let (from, to) = PARAMETER_COLLISION;
    sorted(value).to_string().replace(from, to)
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(
                keys.into_iter()
                    .map(|k| (k.clone(), sorted(&map[k])))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Function name from a function resource name (`...:function:name[:alias]`)
pub fn function_name_from_arn(arn: &str) -> Option<&str> {
    let mut parts = arn.split(':');
    parts.find(|p| *p == "function")?;
    parts.next().filter(|name| !name.is_empty())
}

/// Whether `entry` logged the same arguments the flow passed
fn payload_matches(arguments: &Value, entry: &FunctionLogEntry) -> bool {
    match PayloadKind::of(entry) {
        Some(PayloadKind::Parameter) => {
            let logged = entry.parameters.clone().unwrap_or(Value::Null);
            normalize_payload(&logged) == normalize_payload(arguments)
        }
        Some(PayloadKind::Event) => {
            let Some(mut logged) = entry
                .event
                .as_ref()
                .and_then(|e| e.pointer("/Details/Parameters"))
                .cloned()
            else {
                return false;
            };
            let mut passed = arguments.clone();

            if let (Value::Object(l), Value::Object(p)) = (&mut logged, &mut passed) {
                if l.contains_key(VOLATILE_CONFIG_KEY) && p.contains_key(VOLATILE_CONFIG_KEY) {
                    l.remove(VOLATILE_CONFIG_KEY);
                    p.remove(VOLATILE_CONFIG_KEY);
                }
            }

            normalize_payload(&logged) == normalize_payload(&passed)
        }
        None => false,
    }
}

/// Absolute gap in milliseconds; entries without a timestamp sort last
fn gap_millis(event: &FlowEvent, entry: &FunctionLogEntry) -> i64 {
    entry
        .timestamp
        .map(|ts| (ts - event.timestamp).num_milliseconds().abs())
        .unwrap_or(i64::MAX)
}

/// Find the trace id of the call `event` made
///
/// # Arguments
/// * `event` - An external-invocation flow event
/// * `entries` - Every log entry of the invoked function
///
/// # Returns
/// The trace id of the single matching entry, or of the matching entry
/// closest in time (first one on equal gaps). `None` when nothing matches;
/// a miss is logged, never raised.
pub fn correlate(event: &FlowEvent, entries: &[FunctionLogEntry]) -> Option<TraceMatch> {
    let arguments = Value::Object(
        invocation_arguments(&event.parameters)
            .into_iter()
            .collect::<Map<String, Value>>(),
    );

    let matches: Vec<&FunctionLogEntry> = entries
        .iter()
        .filter(|entry| entry.interaction_id.as_deref() == Some(event.interaction_id.as_str()))
        .filter(|entry| payload_matches(&arguments, entry))
        .collect();

    let traced: Vec<&FunctionLogEntry> = matches
        .iter()
        .copied()
        .filter(|entry| entry.trace_id.is_some())
        .collect();

    if traced.len() < matches.len() {
        debug!(
            "{} matching log entries without trace id ignored",
            matches.len() - traced.len()
        );
    }

    // min_by_key keeps the first of equal minimums
    let chosen = traced.iter().min_by_key(|entry| gap_millis(event, entry));

    match chosen.and_then(|entry| entry.trace_id.clone()) {
        Some(trace_id) => {
            debug!(
                "Event {} correlated to trace {} ({} candidate(s))",
                event.node_id(),
                trace_id,
                traced.len()
            );
            Some(TraceMatch {
                trace_id,
                candidates: traced.len(),
            })
        }
        None => {
            warn!(
                "No invocation log matches event {} of interaction {}",
                event.node_id(),
                event.interaction_id
            );
            None
        }
    }
}
