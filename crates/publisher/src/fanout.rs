//! FanoutSink - publishes each record to every sink

use std::sync::Arc;

use contracts::{ContractError, OutputMessage, OutputSink, Topic};

/// Fan-out over several sinks
///
/// Every sink receives the record even when an earlier one fails; the first
/// failure is reported after all sinks were tried.
pub struct FanoutSink {
    name: String,
    sinks: Vec<Arc<dyn OutputSink>>,
}

impl FanoutSink {
    pub fn new(name: impl Into<String>, sinks: Vec<Arc<dyn OutputSink>>) -> Self {
        Self {
            name: name.into(),
            sinks,
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl OutputSink for FanoutSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, topic: Topic, message: OutputMessage) -> Result<(), ContractError> {
        let mut first_error = None;
        let Some((last, rest)) = self.sinks.split_last() else {
            return Ok(());
        };
        for sink in rest {
            if let Err(e) = sink.publish(topic, message.clone()) {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = last.publish(topic, message) {
            first_error.get_or_insert(e);
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use chrono::Utc;
    use contracts::{ExtrinsicsMessage, Header};

    struct FailingSink;

    impl OutputSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn publish(&self, topic: Topic, _message: OutputMessage) -> Result<(), ContractError> {
            Err(ContractError::sink_publish("failing", topic.as_str(), "boom"))
        }
    }

    #[test]
    fn test_failing_sink_does_not_stop_others() {
        let a = Arc::new(MemorySink::new("a"));
        let b = Arc::new(MemorySink::new("b"));
        let fanout = FanoutSink::new(
            "fanout",
            vec![a.clone(), Arc::new(FailingSink), b.clone()],
        );

        let msg = ExtrinsicsMessage::zeroed(Header::new("x", Utc::now()));
        let result = fanout.publish(Topic::Extrinsics, msg.into());

        assert!(result.is_err());
        assert_eq!(a.count(Topic::Extrinsics), 1);
        assert_eq!(b.count(Topic::Extrinsics), 1);
    }

    #[test]
    fn test_empty_fanout() {
        let fanout = FanoutSink::new("fanout", Vec::new());
        assert!(fanout.is_empty());
        let msg = ExtrinsicsMessage::zeroed(Header::new("x", Utc::now()));
        assert!(fanout.publish(Topic::Extrinsics, msg.into()).is_ok());
    }
}
