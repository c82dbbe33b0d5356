use crate::config::KafkaConfig;
use crate::router::RecordSink;
use crate::{Error, Result};
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;

/// Kafka producer for the destination topics.
///
/// `publish` resolves only when the broker acknowledges (or rejects) the
/// message. The wait is bounded by `message.timeout.ms`, after which
/// librdkafka fails the delivery report.
pub struct RelayProducer {
    producer: FutureProducer,
}

impl RelayProducer {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("compression.type", &config.compression)
            .set("acks", &config.acks)
            .set("linger.ms", config.linger_ms.to_string())
            .set("message.timeout.ms", config.message_timeout_ms.to_string())
            .create()
            .map_err(Error::Kafka)?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl RecordSink for RelayProducer {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        // No message key: partition assignment is left to the broker.
        let record: FutureRecord<'_, str, [u8]> = FutureRecord {
            topic,
            partition: None,
            payload: Some(payload),
            key: None,
            timestamp: None,
            headers: None,
        };

        self.producer
            .send(record, rdkafka::util::Timeout::Never)
            .await
            .map_err(|(e, _)| Error::Kafka(e))?;

        Ok(())
    }
}
