use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A payment event as it arrives on the input topic.
///
/// Field names match the upstream JSON wire format exactly. Fields absent
/// from the payload decode to their zero values; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PaymentEvent {
    pub id: i64,
    pub login: String,
    pub payment: f64,
    pub status: String,
}

/// A raw record taken off the input topic.
///
/// Carries the payload plus the topic/partition/offset identity needed to
/// commit the record after processing.
#[derive(Debug, Clone)]
pub struct InboundRecord {
    pub payload: Bytes,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl InboundRecord {
    pub fn new(payload: impl Into<Bytes>, topic: &str, partition: i32, offset: i64) -> Self {
        Self {
            payload: payload.into(),
            topic: topic.to_string(),
            partition,
            offset,
        }
    }
}
