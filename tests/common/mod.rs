use async_trait::async_trait;
use bytes::Bytes;
use rdkafka::error::KafkaError;
use rdkafka::types::RDKafkaErrorCode;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use topic_relay::message::InboundRecord;
use topic_relay::router::{RecordSink, RecordSource};
use topic_relay::store::IdempotencyStore;
use topic_relay::Error;

/// Builds an inbound record on partition 0 of the test input topic.
pub fn inbound(payload: &str, offset: i64) -> InboundRecord {
    InboundRecord::new(Bytes::copy_from_slice(payload.as_bytes()), "payments", 0, offset)
}

/// The kind of consumer error that ends a run.
pub fn terminal_error() -> Error {
    Error::Kafka(KafkaError::MessageConsumption(
        RDKafkaErrorCode::AllBrokersDown,
    ))
}

/// Feeds a fixed script of poll results to the router, then cancels the
/// shutdown token so the run drains cleanly.
pub struct ScriptedSource {
    script: Mutex<VecDeque<topic_relay::Result<InboundRecord>>>,
    commits: Mutex<Vec<(i32, i64)>>,
    polls: Mutex<u64>,
    shutdown: CancellationToken,
}

impl ScriptedSource {
    pub fn new(
        script: Vec<topic_relay::Result<InboundRecord>>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            commits: Mutex::new(Vec::new()),
            polls: Mutex::new(0),
            shutdown,
        }
    }

    /// Offsets committed so far, as (partition, offset) pairs.
    pub fn committed_offsets(&self) -> Vec<(i32, i64)> {
        self.commits.lock().unwrap().clone()
    }

    pub fn polls(&self) -> u64 {
        *self.polls.lock().unwrap()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordSource for ScriptedSource {
    async fn poll(&self, _timeout: Duration) -> topic_relay::Result<Option<InboundRecord>> {
        *self.polls.lock().unwrap() += 1;

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e),
            None => {
                self.shutdown.cancel();
                Ok(None)
            }
        }
    }

    fn commit(&self, record: &InboundRecord) -> topic_relay::Result<()> {
        self.commits
            .lock()
            .unwrap()
            .push((record.partition, record.offset));
        Ok(())
    }
}

/// Records every publish; can be told to fail the first N sends.
pub struct RecordingSink {
    published: Mutex<Vec<(String, Vec<u8>)>>,
    fail_next: Mutex<u32>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail_next: Mutex::new(0),
        }
    }

    pub fn failing_first(n: u32) -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail_next: Mutex::new(n),
        }
    }

    /// Everything successfully published, as (topic, payload) pairs.
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSink for RecordingSink {
    async fn publish(&self, topic: &str, payload: &[u8]) -> topic_relay::Result<()> {
        {
            let mut fail_next = self.fail_next.lock().unwrap();
            if *fail_next > 0 {
                *fail_next -= 1;
                return Err(Error::Kafka(KafkaError::MessageProduction(
                    RDKafkaErrorCode::MessageTimedOut,
                )));
            }
        }

        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Idempotency store that always errors.
pub struct FailingStore;

#[async_trait]
impl IdempotencyStore for FailingStore {
    async fn set_if_absent(&self, _: &str, _: &str, _: Duration) -> topic_relay::Result<bool> {
        Err(Error::Timeout {
            message: "store unavailable".to_string(),
        })
    }

    async fn ping(&self) -> topic_relay::Result<()> {
        Err(Error::Timeout {
            message: "store unavailable".to_string(),
        })
    }
}
