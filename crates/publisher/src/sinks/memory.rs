//! MemorySink - in-process record store
//!
//! Keeps every published record per topic and latches the last value of
//! durable topics so late readers still observe it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use contracts::{ContractError, OutputMessage, OutputSink, Topic};
use tracing::trace;

#[derive(Debug, Default)]
struct Store {
    history: HashMap<Topic, Vec<OutputMessage>>,
    latched: HashMap<Topic, OutputMessage>,
    order: Vec<Topic>,
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct MemorySink {
    name: String,
    store: Mutex<Store>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: Mutex::default(),
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Last latched value of a durable topic
    pub fn latched(&self, topic: Topic) -> Option<OutputMessage> {
        self.store().latched.get(&topic).cloned()
    }

    /// Number of records published on a topic
    pub fn count(&self, topic: Topic) -> usize {
        self.store().history.get(&topic).map_or(0, Vec::len)
    }

    /// All records published on a topic, oldest first
    pub fn messages(&self, topic: Topic) -> Vec<OutputMessage> {
        self.store().history.get(&topic).cloned().unwrap_or_default()
    }

    /// Topics in publish order across all records
    pub fn publish_order(&self) -> Vec<Topic> {
        self.store().order.clone()
    }

    /// Total records published
    pub fn total(&self) -> usize {
        self.store().order.len()
    }
}

impl OutputSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, topic: Topic, message: OutputMessage) -> Result<(), ContractError> {
        let mut store = self.store();
        if topic.is_latched() {
            store.latched.insert(topic, message.clone());
        }
        store.history.entry(topic).or_default().push(message);
        store.order.push(topic);
        trace!(sink = %self.name, topic = %topic, "record stored");
        Ok(())
    }
}
