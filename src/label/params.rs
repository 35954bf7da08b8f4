//! Typed parameter views per module type.
//!
//! Internally parameters stay an ordered key/value map; this union is built
//! only where module-specific formatting needs to know their shape.

use super::wrap::display_value;
use crate::parser::{ModuleType, Parameters};
use crate::utils::error::ParseError;
use serde_json::Value;

/// Parameters of one flow block, shaped by its module type
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleParams {
    Comparison {
        method: Option<String>,
        value: String,
        second_value: String,
    },
    ExternalInvocation {
        arguments: Parameters,
    },
    Prompt {
        text: Option<String>,
        location: Option<String>,
    },
    Tags(Parameters),
    Attributes(Vec<(String, Value)>),
    Logging {
        behavior: String,
    },
    FlowControl(Parameters),
    CustomerProfile {
        profile_id: Option<String>,
    },
    ProfileAssociation {
        first: Value,
        second: Value,
    },
    Empty,
    Generic(Parameters),
}

impl ModuleParams {
    /// Shape `parameters` according to `module_type`
    ///
    /// # Errors
    /// * `ParseError::MissingField` - a field the module type cannot be shown without
    pub fn from_event(
        module_type: &ModuleType,
        parameters: &Parameters,
        result_data: Option<&Value>,
    ) -> Result<Self, ParseError> {
        let missing = |field: &str| ParseError::MissingField {
            module_type: module_type.to_string(),
            field: field.to_string(),
        };

        Ok(match module_type {
            ModuleType::CheckAttribute => Self::Comparison {
                method: parameters
                    .get("ComparisonMethod")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                value: parameters.get("Value").map(display_value).unwrap_or_else(|| "None".into()),
                second_value: parameters
                    .get("SecondValue")
                    .map(display_value)
                    .unwrap_or_else(|| "None".into()),
            },
            ModuleType::InvokeExternalResource | ModuleType::InvokeLambdaFunction => {
                Self::ExternalInvocation {
                    arguments: invocation_arguments(parameters),
                }
            }
            ModuleType::PlayPrompt | ModuleType::GetUserInput | ModuleType::StoreUserInput => {
                let text = parameters
                    .get("Text")
                    .and_then(Value::as_str)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string);
                let location = if parameters.contains_key("PromptSource") {
                    parameters
                        .get("PromptLocation")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                } else {
                    None
                };
                Self::Prompt { text, location }
            }
            ModuleType::TagContact => Self::Tags(object_entries(parameters.get("Tags"))),
            ModuleType::SetAttributes | ModuleType::SetFlowAttributes => {
                Self::Attributes(attribute_assignments(parameters))
            }
            ModuleType::SetLoggingBehavior => Self::Logging {
                behavior: parameters
                    .get("LoggingBehavior")
                    .map(display_value)
                    .ok_or_else(|| missing("LoggingBehavior"))?,
            },
            ModuleType::SetContactFlow | ModuleType::SetContactData => {
                Self::FlowControl(parameters.clone())
            }
            ModuleType::GetCustomerProfile => Self::CustomerProfile {
                profile_id: result_data
                    .and_then(|d| d.get("ProfileId"))
                    .map(display_value),
            },
            ModuleType::AssociateContactToCustomerProfile => {
                let data = parameters
                    .get("ProfileRequestData")
                    .and_then(Value::as_array)
                    .filter(|items| items.len() >= 2)
                    .ok_or_else(|| missing("ProfileRequestData"))?;
                Self::ProfileAssociation {
                    first: data[0].clone(),
                    second: data[1].clone(),
                }
            }
            ModuleType::Dial | ModuleType::Resume | ModuleType::ReturnFromFlowModule => Self::Empty,
            _ => Self::Generic(parameters.clone()),
        })
    }
}

/// Key/value assignments made by an attribute-set block
///
/// A block either carries one `Key`/`Value` pair or a plain map of
/// assignments.
pub fn attribute_assignments(parameters: &Parameters) -> Vec<(String, Value)> {
    match parameters.get("Key") {
        Some(key) => vec![(
            display_value(key),
            parameters.get("Value").cloned().unwrap_or(Value::Null),
        )],
        None => parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

/// Nested `Parameters` map handed to an invoked function
pub fn invocation_arguments(parameters: &Parameters) -> Parameters {
    object_entries(parameters.get("Parameters"))
}

fn object_entries(value: Option<&Value>) -> Parameters {
    match value {
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        _ => Parameters::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Parameters {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => Parameters::new(),
        }
    }

    #[test]
    fn test_single_key_assignment() {
        let p = params(json!({"Key": "lang", "Value": "ko"}));
        assert_eq!(attribute_assignments(&p), vec![("lang".to_string(), json!("ko"))]);
    }

    #[test]
    fn test_map_assignments_keep_order() {
        let p = params(json!({"b": 1, "a": 2}));
        let keys: Vec<_> = attribute_assignments(&p).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_logging_requires_behavior() {
        let err = ModuleParams::from_event(&ModuleType::SetLoggingBehavior, &Parameters::new(), None);
        assert!(matches!(err, Err(ParseError::MissingField { .. })));
    }

    #[test]
    fn test_profile_association_needs_two_entries() {
        let p = params(json!({"ProfileRequestData": ["only-one"]}));
        assert!(ModuleParams::from_event(&ModuleType::AssociateContactToCustomerProfile, &p, None).is_err());
    }

    #[test]
    fn test_invocation_arguments() {
        let p = params(json!({"FunctionArn": "fn", "Parameters": {"x": 1}}));
        match ModuleParams::from_event(&ModuleType::InvokeExternalResource, &p, None).unwrap() {
            ModuleParams::ExternalInvocation { arguments } => assert_eq!(arguments["x"], json!(1)),
            other => panic!("unexpected {:?}", other),
        }
    }
}
