//! Error classification for single event records.
//!
//! Classification never fails: a missing or oddly-typed result payload
//! simply means "not an error".

use crate::parser::FlowEvent;
use crate::utils::config::ERROR_KEYWORDS;
use serde_json::Value;

/// Whether an event represents a failure
///
/// **Public** - used by the assembler and deduplicator
///
/// An event is an error when its result text contains one of the error
/// keywords (case-sensitive), or when it is an external invocation whose
/// structured result reports `isSuccess == "false"`.
pub fn is_error(event: &FlowEvent) -> bool {
    has_error_keyword(&event.result_text()) || is_failed_invocation(event)
}

/// Keyword check over a plain result string
pub fn has_error_keyword(text: &str) -> bool {
    ERROR_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// Structured-result check for external invocations
///
/// Only the string `"false"` counts; an absent flag or a non-string value
/// is not an error.
pub fn is_failed_invocation(event: &FlowEvent) -> bool {
    if !event.module_type.is_external_invocation() {
        return false;
    }

    event
        .external_results
        .as_ref()
        .and_then(|results| results.get("isSuccess"))
        .and_then(Value::as_str)
        == Some("false")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn event(module_type: &str, extra: Value) -> FlowEvent {
        let mut record = json!({
            "Timestamp": "2024-05-01T01:02:03.000Z",
            "ContactId": "c-1",
            "ContactFlowName": "Main",
            "ContactFlowModuleType": module_type,
        });
        if let (Value::Object(base), Value::Object(more)) = (&mut record, extra) {
            base.extend(more);
        }
        FlowEvent::from_value(record, 0).unwrap()
    }

    #[test]
    fn test_keyword_match_is_case_sensitive() {
        assert!(is_error(&event("PlayPrompt", json!({"Results": "Lambda Timeout"}))));
        assert!(is_error(&event("CheckAttribute", json!({"Results": "NoMatchingCondition not found"}))));
        assert!(!is_error(&event("PlayPrompt", json!({"Results": "error"}))));
        assert!(!is_error(&event("PlayPrompt", json!({"Results": "Success"}))));
    }

    #[test]
    fn test_structured_result_keyword() {
        assert!(is_error(&event("PlayPrompt", json!({"Results": {"reason": "Exception raised"}}))));
    }

    #[test]
    fn test_failed_invocation() {
        let failed = event("InvokeExternalResource", json!({"ExternalResults": {"isSuccess": "false"}}));
        assert!(is_error(&failed));
        assert!(is_error(&failed), "classification is pure");
    }

    #[test]
    fn test_invocation_flag_absent_or_mistyped() {
        assert!(!is_error(&event("InvokeExternalResource", json!({"ExternalResults": {"code": 1}}))));
        assert!(!is_error(&event("InvokeExternalResource", json!({"ExternalResults": {"isSuccess": false}}))));
        assert!(!is_error(&event("InvokeExternalResource", json!({"ExternalResults": "false"}))));
        assert!(!is_error(&event("InvokeExternalResource", json!({}))));
    }

    #[test]
    fn test_flag_ignored_for_other_types() {
        assert!(!is_error(&event("PlayPrompt", json!({"ExternalResults": {"isSuccess": "false"}}))));
    }
}
