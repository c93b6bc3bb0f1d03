//! QueuedSink - isolates a sink behind a bounded queue and worker task

use std::sync::{Arc, Mutex};

use contracts::{ContractError, OutputMessage, OutputSink, Topic};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use crate::metrics::SinkMetrics;

type Envelope = (Topic, OutputMessage);

/// Bounded queue in front of a sink
///
/// `publish` never blocks: when the queue is full the record is dropped and
/// counted. Records are handed to the wrapped sink by a Tokio worker task.
pub struct QueuedSink {
    name: String,
    tx: Mutex<Option<mpsc::Sender<Envelope>>>,
    metrics: Arc<SinkMetrics>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl QueuedSink {
    /// Wrap `sink` and spawn its worker
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(sink: Arc<dyn OutputSink>, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker = tokio::spawn(sink_worker(sink, rx, worker_metrics));

        Self {
            name,
            tx: Mutex::new(Some(tx)),
            metrics,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Shared metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Close the queue and wait for the worker to drain it
    #[instrument(name = "queued_sink_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(&self) {
        // dropping the sender ends the worker loop once the queue is drained
        drop(self.tx.lock().unwrap_or_else(|e| e.into_inner()).take());

        let worker = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(sink = %self.name, error = ?e, "sink worker panicked");
            }
        }
        debug!(sink = %self.name, "queued sink shutdown complete");
    }
}

impl OutputSink for QueuedSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish(&self, topic: Topic, message: OutputMessage) -> Result<(), ContractError> {
        let guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        let Some(tx) = guard.as_ref() else {
            return Err(ContractError::sink_publish(&self.name, topic.as_str(), "sink closed"));
        };

        match tx.try_send((topic, message)) {
            Ok(()) => {
                self.metrics
                    .record_enqueued(tx.max_capacity() - tx.capacity());
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_dropped();
                observability::record_sink_dropped(&self.name);
                Err(ContractError::sink_publish(
                    &self.name,
                    topic.as_str(),
                    "queue full, record dropped",
                ))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ContractError::sink_publish(
                &self.name,
                topic.as_str(),
                "sink worker closed unexpectedly",
            )),
        }
    }
}

/// Worker task that drains the queue into the wrapped sink
async fn sink_worker(
    sink: Arc<dyn OutputSink>,
    mut rx: mpsc::Receiver<Envelope>,
    metrics: Arc<SinkMetrics>,
) {
    debug!(sink = %sink.name(), "sink worker started");

    while let Some((topic, message)) = rx.recv().await {
        let result = sink.publish(topic, message);
        metrics.record_delivery(result.is_ok());
        if let Err(e) = result {
            error!(sink = %sink.name(), topic = %topic, error = %e, "publish failed");
        }
    }

    debug!(sink = %sink.name(), "sink worker stopped");
}
