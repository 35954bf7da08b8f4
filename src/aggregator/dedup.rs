//! Run-length aggregation of low-information events.
//!
//! Consecutive attribute-setting blocks add little on their own, so a run of
//! them collapses into one node carrying every assignment of the run.
//!
//! State machine:
//! - `Scanning` -> `Aggregating(key)` on an aggregatable event
//! - `Aggregating(key)` stays on an event with the same key
//! - `Aggregating(key)` flushes back to `Scanning` on any other event or at
//!   end of stream

use crate::graph::{Node, NodeCard, NodeLink};
use crate::label::{aggregate_text, attribute_assignments, displayable_block_id, DisplayNames};
use crate::parser::{FlowEvent, ModuleType};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::debug;
use serde_json::{json, Value};

/// Bucket identity: flow name plus module type
pub type BucketKey = (String, ModuleType);

/// Accumulated run of same-type events
#[derive(Debug, Clone)]
pub struct AggregateBucket {
    /// Id of the first event of the run
    pub node_id: String,
    pub flow_name: String,
    pub module_type: ModuleType,
    pub timestamp: DateTime<Utc>,
    pub block_identifier: Option<String>,
    /// Every assignment of the run, in order, duplicates kept
    pub assignments: Vec<(String, Value)>,
    /// Raw parameter payload of each member event
    pub parameters: Vec<Value>,
    /// True if any member event is an error
    pub is_error: bool,
}

impl AggregateBucket {
    /// Render the bucket as one node
    pub fn into_node(self, names: &DisplayNames) -> Node {
        let text = aggregate_text(&self.assignments);
        let card = NodeCard {
            kind: self.module_type.to_string(),
            title: names.aggregate_title(self.module_type.as_str(), self.assignments.len()),
            block_id: displayable_block_id(self.block_identifier.as_deref()),
            body: text.body,
            footer: None,
        };

        let raw = json!({
            "id": self.node_id,
            "contact_flow_name": self.flow_name,
            "module_type": self.module_type.as_str(),
            "timestamp": self.timestamp.to_rfc3339(),
            "blockIdentifier": self.block_identifier,
            "Parameters": self.parameters,
            "is_error": self.is_error,
        });
        let link = NodeLink::Raw(serde_json::to_string_pretty(&raw).unwrap_or_default());

        Node::card(self.node_id, card, self.is_error, link)
    }
}

/// Open aggregate buckets, in creation order
#[derive(Debug, Default)]
pub struct AggregateCache {
    buckets: IndexMap<BucketKey, AggregateBucket>,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` to the bucket for its key, creating it if needed
    pub fn add(&mut self, node_id: &str, event: &FlowEvent, is_error: bool) {
        let key = (event.flow_name.clone(), event.module_type.clone());
        let assignments = attribute_assignments(&event.parameters);
        let parameters = Value::Object(
            event
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        let bucket = self.buckets.entry(key).or_insert_with(|| AggregateBucket {
            node_id: node_id.to_string(),
            flow_name: event.flow_name.clone(),
            module_type: event.module_type.clone(),
            timestamp: event.timestamp,
            block_identifier: event.block_identifier.clone(),
            assignments: Vec::new(),
            parameters: Vec::new(),
            is_error: false,
        });

        bucket.assignments.extend(assignments);
        bucket.parameters.push(parameters);
        bucket.is_error |= is_error;
    }

    /// Drain every bucket, oldest first
    pub fn flush(&mut self) -> Vec<AggregateBucket> {
        self.buckets.drain(..).map(|(_, bucket)| bucket).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Current state of the aggregation loop
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DedupState {
    #[default]
    Scanning,
    Aggregating(BucketKey),
}

/// Drives the aggregation state machine over an ordered event stream
#[derive(Debug, Default)]
pub struct Deduplicator {
    state: DedupState,
    cache: AggregateCache,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DedupState {
        &self.state
    }

    /// Feed an aggregatable event
    ///
    /// Returns the buckets closed by this event (a run of a different key),
    /// which must be emitted before anything that follows.
    pub fn absorb(&mut self, node_id: &str, event: &FlowEvent, is_error: bool) -> Vec<AggregateBucket> {
        let key = (event.flow_name.clone(), event.module_type.clone());

        let closed = match &self.state {
            DedupState::Aggregating(open) if *open != key => self.cache.flush(),
            _ => Vec::new(),
        };

        self.cache.add(node_id, event, is_error);
        self.state = DedupState::Aggregating(key);
        closed
    }

    /// Close the open run, if any
    ///
    /// Called before any non-aggregated node is emitted and at end of stream.
    pub fn interrupt(&mut self) -> Vec<AggregateBucket> {
        self.state = DedupState::Scanning;
        if self.cache.is_empty() {
            return Vec::new();
        }
        let closed = self.cache.flush();
        debug!("Flushed {} aggregate bucket(s)", closed.len());
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(ordinal: usize, flow: &str, module_type: &str, parameters: Value) -> FlowEvent {
        FlowEvent::from_value(
            json!({
                "Timestamp": format!("2024-05-01T01:02:{:02}.000Z", ordinal),
                "ContactId": "c-1",
                "ContactFlowName": flow,
                "ContactFlowModuleType": module_type,
                "Identifier": "Set attrs",
                "Parameters": parameters,
            }),
            ordinal,
        )
        .unwrap()
    }

    #[test]
    fn test_run_collapses_into_one_bucket() {
        let mut dedup = Deduplicator::new();
        let a = event(1, "Main", "SetAttributes", json!({"Key": "a", "Value": "1"}));
        let b = event(2, "Main", "SetAttributes", json!({"x": 1, "y": 2}));

        assert!(dedup.absorb(&a.node_id(), &a, false).is_empty());
        assert!(dedup.absorb(&b.node_id(), &b, true).is_empty());

        let closed = dedup.interrupt();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].assignments.len(), 3);
        assert_eq!(closed[0].node_id, a.node_id());
        assert!(closed[0].is_error);
        assert_eq!(dedup.state(), &DedupState::Scanning);
    }

    #[test]
    fn test_different_type_flushes_previous_run() {
        let mut dedup = Deduplicator::new();
        let a = event(1, "Main", "SetAttributes", json!({"Key": "a", "Value": "1"}));
        let b = event(2, "Main", "SetFlowAttributes", json!({"Key": "b", "Value": "2"}));

        dedup.absorb(&a.node_id(), &a, false);
        let closed = dedup.absorb(&b.node_id(), &b, false);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].module_type, ModuleType::SetAttributes);
        assert_eq!(
            dedup.state(),
            &DedupState::Aggregating(("Main".to_string(), ModuleType::SetFlowAttributes))
        );
    }

    #[test]
    fn test_interrupt_when_scanning_is_noop() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.interrupt().is_empty());
    }

    #[test]
    fn test_bucket_node() {
        let mut cache = AggregateCache::new();
        let a = event(1, "Main", "SetAttributes", json!({"Key": "a", "Value": "1"}));
        cache.add("n1", &a, false);
        cache.add("n2", &a, false);

        let node = cache.flush().remove(0).into_node(&DisplayNames::default());
        assert_eq!(node.id, "n1");
        assert_eq!(node.title(), "SetAttributes x 2");
        assert!(!node.error);
        assert!(cache.is_empty());
    }
}
