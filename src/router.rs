//! The driver loop that moves records from the source through the pipeline
//! to the sink.
//!
//! The router owns no broker specifics; it talks to its collaborators
//! through [`RecordSource`] and [`RecordSink`] and advances the consumer
//! offset for every record it saw, whatever the pipeline decided.

use crate::message::InboundRecord;
use crate::pipeline::{Outcome, Pipeline};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Source of inbound records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Waits up to `timeout` for the next record.
    ///
    /// `Ok(None)` means nothing arrived within the window. `Err` is a
    /// terminal broker failure and ends the run.
    async fn poll(&self, timeout: Duration) -> Result<Option<InboundRecord>>;

    /// Marks `record` as processed so its offset is committed.
    fn commit(&self, record: &InboundRecord) -> Result<()>;
}

/// Sink for outbound messages.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Publishes `payload` to `topic`, resolving on the delivery ack.
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Running,
    Draining,
    Stopped,
}

/// Counters kept per run and logged at shutdown.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelayStats {
    pub published: u64,
    pub no_route: u64,
    pub duplicates: u64,
    pub decode_errors: u64,
    pub store_errors: u64,
    pub publish_errors: u64,
}

pub struct Router {
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn RecordSink>,
    pipeline: Pipeline,
    poll_timeout: Duration,
    state: RouterState,
    stats: RelayStats,
}

impl Router {
    pub fn new(
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn RecordSink>,
        pipeline: Pipeline,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            source,
            sink,
            pipeline,
            poll_timeout,
            state: RouterState::Running,
            stats: RelayStats::default(),
        }
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Runs until `shutdown` is cancelled or the source fails terminally.
    ///
    /// Cancellation finishes the in-flight record, commits it and returns
    /// `Ok(())`. A terminal source error drains the same way and returns the
    /// error.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        info!(poll_timeout_ms = self.poll_timeout.as_millis() as u64, "Router starting");
        self.state = RouterState::Running;

        let result = loop {
            if shutdown.is_cancelled() {
                info!("Shutdown requested, draining");
                self.state = RouterState::Draining;
                break Ok(());
            }

            match self.source.poll(self.poll_timeout).await {
                Ok(Some(record)) => self.handle_record(record).await,
                Ok(None) => continue,
                Err(e) => {
                    error!(error = %e, "Terminal broker error, draining");
                    self.state = RouterState::Draining;
                    break Err(e);
                }
            }
        };

        self.state = RouterState::Stopped;
        info!("Router stopped");
        result
    }

    async fn handle_record(&mut self, record: InboundRecord) {
        let outcome = self.pipeline.process(&record.payload).await;

        match &outcome {
            Outcome::Admitted { topic, payload } => match self.sink.publish(topic, payload).await {
                Ok(()) => {
                    self.stats.published += 1;
                    debug!(
                        topic = %topic,
                        partition = record.partition,
                        offset = record.offset,
                        "Message published"
                    );
                }
                Err(e) => {
                    // At-most-once: the message is dropped but its offset
                    // still advances.
                    self.stats.publish_errors += 1;
                    warn!(
                        error = %e,
                        topic = %topic,
                        partition = record.partition,
                        offset = record.offset,
                        "Publish failed, dropping message"
                    );
                }
            },
            Outcome::NoRoute { status } => {
                self.stats.no_route += 1;
                debug!(
                    status = %status,
                    partition = record.partition,
                    offset = record.offset,
                    "No route for status, skipping"
                );
            }
            Outcome::Duplicate { key } => {
                self.stats.duplicates += 1;
                debug!(
                    key = %key,
                    partition = record.partition,
                    offset = record.offset,
                    "Duplicate suppressed"
                );
            }
            Outcome::DecodeFailed(e) => {
                self.stats.decode_errors += 1;
                warn!(
                    error = %e,
                    partition = record.partition,
                    offset = record.offset,
                    payload = %String::from_utf8_lossy(&record.payload),
                    "Undecodable record, skipping"
                );
            }
            Outcome::StoreFailed(e) => {
                self.stats.store_errors += 1;
                warn!(
                    error = %e,
                    partition = record.partition,
                    offset = record.offset,
                    "Store unavailable, dropping record unadmitted"
                );
            }
        }

        // Every record that reached decoding advances the offset, whatever
        // its outcome.
        if let Err(e) = self.source.commit(&record) {
            warn!(
                error = %e,
                partition = record.partition,
                offset = record.offset,
                "Failed to store offset"
            );
        }
    }
}
