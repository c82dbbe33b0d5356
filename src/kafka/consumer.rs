use crate::config::KafkaConfig;
use crate::message::InboundRecord;
use crate::router::RecordSource;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::{ClientConfig, Message};
use std::time::Duration;
use tracing::info;

/// Kafka consumer for the input topic.
///
/// Offsets are stored explicitly per record (`enable.auto.offset.store` is
/// off) and flushed by librdkafka's auto-commit. A record's offset is only
/// stored once [`commit`](RecordSource::commit) is called for it, so commits
/// track processing rather than delivery.
pub struct RelayConsumer {
    consumer: StreamConsumer,
}

impl RelayConsumer {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("group.id", &config.group_id)
            .set("auto.offset.reset", &config.auto_offset_reset)
            .set("enable.auto.offset.store", "false")
            .create()?;

        consumer.subscribe(&[config.input_topic.as_str()])?;
        info!(
            topic = %config.input_topic,
            group_id = %config.group_id,
            "Subscribed to input topic"
        );

        Ok(Self { consumer })
    }
}

#[async_trait]
impl RecordSource for RelayConsumer {
    async fn poll(&self, timeout: Duration) -> Result<Option<InboundRecord>> {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Ok(Ok(message)) => {
                let payload = message
                    .payload()
                    .map(Bytes::copy_from_slice)
                    .unwrap_or_default();

                Ok(Some(InboundRecord {
                    payload,
                    topic: message.topic().to_string(),
                    partition: message.partition(),
                    offset: message.offset(),
                }))
            }
            Ok(Err(e)) => Err(Error::Kafka(e)),
            // recv() produced nothing within the poll window.
            Err(_) => Ok(None),
        }
    }

    fn commit(&self, record: &InboundRecord) -> Result<()> {
        self.consumer
            .store_offset(&record.topic, record.partition, record.offset)?;
        Ok(())
    }
}
