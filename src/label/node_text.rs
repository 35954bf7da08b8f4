//! Node body and footer layout per module type.

use super::identifier::redact_arns;
use super::params::ModuleParams;
use super::wrap::{display_value, wrap};
use crate::parser::{FlowEvent, ModuleType, Parameters};
use crate::utils::config::{
    ATTRIBUTE_LINE_WIDTH, COMPARISON_INLINE_LIMIT, COMPARISON_VALUE_WIDTH, FOOTER_WIDTH,
    NODE_TEXT_WIDTH, PARAMETER_LINE_WIDTH, PROMPT_LINE_WIDTH, PROMPT_RESULT_WIDTH,
};
use crate::utils::error::ParseError;
use serde_json::Value;

/// Footer of a node card before decoration
#[derive(Debug, Clone, PartialEq)]
pub enum Footer {
    /// Result text of the block
    Results(String),
    /// Structured result of an external invocation
    ExternalResults(Value),
}

/// Body and footer of one node card
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeText {
    pub body: String,
    pub footer: Option<Footer>,
}

/// Lay out body and footer for one event
///
/// Resource names are redacted before anything is shown.
///
/// # Errors
/// * `ParseError::MissingField` - the module type needs a field the event lacks
pub fn node_text(event: &FlowEvent) -> Result<NodeText, ParseError> {
    let parameters = redacted(&event.parameters);
    let params = ModuleParams::from_event(&event.module_type, &parameters, event.result_data.as_ref())?;
    let results = event
        .result
        .as_ref()
        .map(|r| display_value(&redact_arns(&Value::String(r.as_plain().into_owned()))));
    let external = event.external_results.as_ref().map(redact_arns);

    Ok(layout(&params, results, external))
}

/// Lay out an aggregate node from its accumulated assignments
pub fn aggregate_text(assignments: &[(String, Value)]) -> NodeText {
    layout(&ModuleParams::Attributes(assignments.to_vec()), None, None)
}

fn redacted(parameters: &Parameters) -> Parameters {
    parameters
        .iter()
        .map(|(k, v)| (k.clone(), redact_arns(v)))
        .collect()
}

fn layout(params: &ModuleParams, results: Option<String>, external: Option<Value>) -> NodeText {
    let mut body = String::new();
    let mut footer = results.clone().map(Footer::Results);

    match params {
        ModuleParams::Comparison {
            method,
            value,
            second_value,
        } => {
            let operand = match method.as_deref() {
                Some("Contains") => "⊃",
                Some("Equals") => "=",
                Some("GreaterThan") => ">",
                Some("GreaterThanOrEqualTo") => "≧",
                Some("LessThan") => "<",
                Some("LessThanOrEqualTo") => "≦",
                Some("StartsWith") => "StartsWith",
                _ => {
                    body.push_str("Invalid Operator");
                    ""
                }
            };
            let value = wrap(value, COMPARISON_VALUE_WIDTH, false);
            let too_long =
                value.chars().count() + second_value.chars().count() > COMPARISON_INLINE_LIMIT;
            if too_long {
                body.push_str(&format!("{} {} \n{} ? ", value, operand, second_value));
            } else {
                body.push_str(&format!("{} {} {} ? ", value, operand, second_value));
            }
        }
        ModuleParams::ExternalInvocation { arguments } => {
            for (key, value) in arguments {
                let line = format!("{} = {}", key, display_value(value));
                body.push_str(&wrap(&line, PARAMETER_LINE_WIDTH, true));
                body.push('\n');
            }
            if let Some(external) = external {
                footer = Some(Footer::ExternalResults(external));
            }
        }
        ModuleParams::Prompt { text, location } => {
            if let Some(text) = text {
                body.push_str(&prompt_lines(text));
            } else if let Some(location) = location {
                let parts: Vec<&str> = location.split('/').collect();
                if parts.len() > 2 {
                    body.push_str(&format!(
                        "Audio prompt : \n{}/{}",
                        parts[parts.len() - 2],
                        parts[parts.len() - 1]
                    ));
                }
            }
            footer = results.map(|r| Footer::Results(wrap(&r, PROMPT_RESULT_WIDTH, true)));
        }
        ModuleParams::Tags(tags) => {
            for (key, value) in tags {
                body.push_str(&format!("{} : {} \n", key, display_value(value)));
            }
            footer = None;
        }
        ModuleParams::Attributes(assignments) => {
            for (key, value) in assignments {
                let line = format!("{} = {}", key, display_value(value));
                body.push_str(&wrap(&line, ATTRIBUTE_LINE_WIDTH, true));
                body.push_str(" \n");
            }
            footer = None;
        }
        ModuleParams::Logging { behavior } => {
            body.push_str(&format!("LoggingBehavior = {}", behavior));
            footer = None;
        }
        ModuleParams::FlowControl(entries) => {
            for (key, value) in entries {
                body.push_str(&format!("{} : {} \n", key, display_value(value)));
            }
            footer = None;
        }
        ModuleParams::CustomerProfile { profile_id } => {
            if let Some(id) = profile_id {
                body.push_str(&format!("ProfileId: {}", id));
            }
        }
        ModuleParams::ProfileAssociation { first, second } => {
            body.push_str(&format!("{}\n{}", display_value(first), display_value(second)));
            footer = None;
        }
        ModuleParams::Empty => {
            footer = None;
        }
        ModuleParams::Generic(entries) => {
            for (key, value) in entries {
                let line = format!("{} = {}", key, display_value(value));
                body.push_str(&wrap(&line, PARAMETER_LINE_WIDTH, true));
                body.push_str(" \n");
            }
        }
    }

    NodeText {
        body: wrap(&body, NODE_TEXT_WIDTH, true),
        footer,
    }
}

/// Break prompt text after punctuation, then split long lines at the middle word
fn prompt_lines(text: &str) -> String {
    let mut out = String::new();
    let broken = text.replace(',', ",\n").replace('.', ".\n");

    for line in broken.split('\n') {
        if line.chars().count() > PROMPT_LINE_WIDTH {
            let mut words: Vec<String> = line.split(' ').map(str::to_string).collect();
            let mid = words.len() / 2;
            words[mid].push('\n');
            out.push_str(&words.join(" "));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    out
}

/// Final footer text with success/failure markers
pub fn decorate_footer(footer: &Footer) -> String {
    match footer {
        Footer::ExternalResults(value) => match value.get("isSuccess").and_then(Value::as_str) {
            Some("true") => "isSuccess: true ✅".to_string(),
            Some("false") => "isSuccess: false ❌".to_string(),
            _ => {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                wrap(&format!("ExternalResults : {}", pretty), FOOTER_WIDTH, true)
            }
        },
        Footer::Results(text) => {
            let footer = format!("Results : {}", text);
            if footer.contains("false") || footer.contains("Fail") {
                format!("{} ❌", footer)
            } else if footer.contains("true") || footer.contains("Success") {
                format!("{} ✅", footer)
            } else {
                footer
            }
        }
    }
}

/// Kind used for the node title, refined for flow-setting blocks
pub fn display_kind(module_type: &ModuleType, parameters: &Parameters) -> String {
    if *module_type == ModuleType::SetContactFlow {
        let refined = match parameters.get("Type").and_then(Value::as_str) {
            Some("CustomerHold") | Some("AgentHold") => Some("SetHoldFlow"),
            Some("CustomerWhisper") | Some("AgentWhisper") => Some("SetWhisperFlow"),
            Some("CustomerQueue") => Some("SetCustomerQueueFlow"),
            Some("DefaultAgentUI") => Some("SetEventHook"),
            _ => None,
        };
        if let Some(kind) = refined {
            return kind.to_string();
        }
    }
    module_type.as_str().to_string()
}
