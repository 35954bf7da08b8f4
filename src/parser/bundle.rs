//! Input bundle reader.
//!
//! Log retrieval happens outside this crate. The collected logs for one
//! interaction and its related interactions are dropped into a directory
//! using a fixed file naming scheme, which this module reads back.

use super::records::{
    parse_flow_events, ContactSummary, FlowEvent, FunctionLogEntry, FunctionLogs, LexTurn,
    TranscriptSegment,
};
use crate::utils::error::ParseError;
use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Everything collected for one interaction
#[derive(Debug, Clone, Default)]
pub struct InteractionInput {
    pub summary: ContactSummary,
    pub events: Vec<FlowEvent>,
    pub function_logs: FunctionLogs,
    pub attributes: IndexMap<String, Value>,
    pub transcript: Vec<TranscriptSegment>,
    pub lex_turns: Vec<LexTurn>,
    pub lex_hook_logs: Vec<FunctionLogEntry>,
}

impl InteractionInput {
    /// Interaction with metadata only
    pub fn new(summary: ContactSummary) -> Self {
        Self {
            summary,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContactDirectory {
    #[serde(default)]
    contact_summary_list: Vec<ContactSummary>,
}

/// A directory of collected logs
#[derive(Debug, Clone)]
pub struct InputBundle {
    root: PathBuf,
}

impl InputBundle {
    /// Open a bundle directory
    ///
    /// **Public** - main entry point for loading
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ParseError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ParseError::InvalidFormat(format!(
                "Input bundle is not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Related interactions listed in `contacts.json`
    pub fn contacts(&self) -> Result<Vec<ContactSummary>, ParseError> {
        let directory: ContactDirectory = self.read_json(&self.root.join("contacts.json"))?;
        debug!("Bundle lists {} contacts", directory.contact_summary_list.len());
        Ok(directory.contact_summary_list)
    }

    /// Load every collected stream for one interaction
    ///
    /// Only the event records are required; other streams default to empty.
    pub fn load_interaction(&self, summary: &ContactSummary) -> Result<InteractionInput, ParseError> {
        let id = summary.contact_id.as_str();
        info!("Loading logs for contact {}", id);

        let records: Vec<Value> = self.read_json(&self.path_for("contact_flow", id))?;
        let events = parse_flow_events(&records)?;

        let function_logs = self
            .read_optional::<IndexMap<String, Vec<Value>>>(&self.path_for("lambda", id))?
            .unwrap_or_default()
            .into_iter()
            .map(|(function, entries)| (function, FunctionLogEntry::parse_all(&entries)))
            .collect();

        let attributes = self
            .read_optional(&self.path_for("attributes", id))?
            .unwrap_or_default();

        let transcript = self
            .read_optional(&self.path_for("transcript", id))?
            .unwrap_or_default();

        let lex_turns = self
            .read_optional(&self.path_for("lex", id))?
            .unwrap_or_default();

        let lex_hook_logs = self
            .read_optional::<Vec<Value>>(&self.path_for("lex_hook", id))?
            .map(|entries| FunctionLogEntry::parse_all(&entries))
            .unwrap_or_default();

        Ok(InteractionInput {
            summary: summary.clone(),
            events,
            function_logs,
            attributes,
            transcript,
            lex_turns,
            lex_hook_logs,
        })
    }

    fn path_for(&self, stream: &str, contact_id: &str) -> PathBuf {
        self.root.join(format!("{}_{}.json", stream, contact_id))
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<T, ParseError> {
        let file = std::fs::File::open(path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    fn read_optional<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>, ParseError> {
        if !path.is_file() {
            debug!("Optional stream absent: {}", path.display());
            return Ok(None);
        }
        self.read_json(path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: Value) {
        std::fs::write(dir.join(name), serde_json::to_vec(&value).unwrap()).unwrap();
    }

    #[test]
    fn test_open_rejects_missing_dir() {
        assert!(InputBundle::open("/definitely/not/here").is_err());
    }

    #[test]
    fn test_load_interaction_with_optional_streams() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "contacts.json",
            json!({"ContactSummaryList": [{"ContactId": "c-1", "InitiationMethod": "INBOUND", "Channel": "VOICE"}]}),
        );
        write(
            dir.path(),
            "contact_flow_c-1.json",
            json!([{"Timestamp": "2024-05-01T01:02:03Z", "ContactId": "c-1",
                    "ContactFlowName": "Main", "ContactFlowModuleType": "Dial"}]),
        );
        write(
            dir.path(),
            "lambda_c-1.json",
            json!({"fn-a": [{"ContactId": "c-1", "message": "hello", "xray_trace_id": "1-a"}]}),
        );

        let bundle = InputBundle::open(dir.path()).unwrap();
        let contacts = bundle.contacts().unwrap();
        assert_eq!(contacts.len(), 1);

        let input = bundle.load_interaction(&contacts[0]).unwrap();
        assert_eq!(input.events.len(), 1);
        assert_eq!(input.function_logs["fn-a"].len(), 1);
        assert!(input.attributes.is_empty());
        assert!(input.transcript.is_empty());
    }
}
