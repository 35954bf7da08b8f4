//! Block identifier validation and resource-name redaction.

use crate::utils::error::IdentifierError;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use uuid::Uuid;

/// Validate that a block identifier is a well-formed UUID
///
/// Flow editors assign UUIDs to unnamed blocks; a named block carries a
/// human label instead, which is worth showing on the node.
pub fn check_block_identifier(identifier: &str) -> Result<Uuid, IdentifierError> {
    Uuid::parse_str(identifier).map_err(|_| IdentifierError::NotUuid(identifier.to_string()))
}

/// Block identifier to show on a node, if any
pub fn displayable_block_id(identifier: Option<&str>) -> Option<String> {
    let identifier = identifier?;
    match check_block_identifier(identifier) {
        Ok(_) => None,
        Err(IdentifierError::NotUuid(label)) => Some(label),
    }
}

fn arn_prefix() -> &'static Regex {
    static ARN_PREFIX: OnceLock<Regex> = OnceLock::new();
    ARN_PREFIX.get_or_init(|| {
        Regex::new(r"arn:aws[a-zA-Z-]*:[a-zA-Z0-9-]+:[a-z0-9-]*:[0-9]*:").expect("valid arn regex")
    })
}

/// Strip the `arn:partition:service:region:account:` prefix from every string
///
/// Walks nested objects and arrays; keys are left untouched.
pub fn redact_arns(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(arn_prefix().replace_all(s, "").into_owned()),
        Value::Array(items) => Value::Array(items.iter().map(redact_arns).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_arns(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
