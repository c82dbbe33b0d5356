//! The per-record processing pipeline: filter, transform, deduplicate.
//!
//! [`Pipeline::process`] runs all three stages over a raw payload and folds
//! every non-publishable condition into a tagged [`Outcome`], so the driver
//! loop never has to distinguish "business skip" from "broken record".

use crate::config::RoutingConfig;
use crate::message::PaymentEvent;
use crate::store::IdempotencyStore;
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// What became of one record.
#[derive(Debug)]
pub enum Outcome {
    /// Routed, projected, first of its deduplication window. Carries the
    /// destination topic and the serialized projection to publish.
    Admitted { topic: String, payload: Vec<u8> },
    /// The status matched no configured route.
    NoRoute { status: String },
    /// An equal dedup key was admitted within the current window.
    Duplicate { key: String },
    /// The payload was not a decodable domain message.
    DecodeFailed(serde_json::Error),
    /// The idempotency store could not answer; the record is not admitted.
    StoreFailed(Error),
}

impl Outcome {
    pub fn tag(&self) -> &'static str {
        match self {
            Outcome::Admitted { .. } => "admitted",
            Outcome::NoRoute { .. } => "no-route",
            Outcome::Duplicate { .. } => "duplicate",
            Outcome::DecodeFailed(_) => "decode-error",
            Outcome::StoreFailed(_) => "store-error",
        }
    }
}

pub struct Pipeline {
    routes: HashMap<String, String>,
    projection: Vec<String>,
    dedupe_field: String,
    window: Duration,
    store: Arc<dyn IdempotencyStore>,
}

impl Pipeline {
    pub fn new(routing: &RoutingConfig, store: Arc<dyn IdempotencyStore>) -> Self {
        if routing.routes.is_empty() {
            warn!("No routes configured, every record will be skipped as no-route");
        }

        let routes = routing
            .routes
            .iter()
            .map(|rule| (rule.status.clone(), rule.topic.clone()))
            .collect();

        Self {
            routes,
            projection: routing.projection.clone(),
            dedupe_field: routing.deduplication.key.clone(),
            window: Duration::from_secs(routing.deduplication.window_secs),
            store,
        }
    }

    /// Maps the event's status to its destination topic, if any.
    pub fn filter(&self, event: &PaymentEvent) -> Option<&str> {
        self.routes.get(&event.status).map(String::as_str)
    }

    /// Builds the outbound projection of `event`.
    ///
    /// Walks the configured projection list; only `id`, `login` and
    /// `payment` are projectable, anything else in the list is skipped.
    /// Fields not listed (always including `status`) are scrubbed by
    /// omission.
    pub fn transform(&self, event: &PaymentEvent) -> Map<String, Value> {
        let mut projected = Map::new();

        for field in &self.projection {
            match field.as_str() {
                "id" => {
                    projected.insert("id".to_string(), Value::from(event.id));
                }
                "login" => {
                    projected.insert("login".to_string(), Value::from(event.login.clone()));
                }
                "payment" => {
                    projected.insert("payment".to_string(), Value::from(event.payment));
                }
                _ => {}
            }
        }

        projected
    }

    /// Claims `key` in the idempotency store for the configured window.
    ///
    /// Returns `true` when this message is the first holder of the key.
    pub async fn deduplicate(&self, key: &str) -> Result<bool> {
        let admitted_at = chrono::Utc::now().to_rfc3339();
        self.store
            .set_if_absent(key, &admitted_at, self.window)
            .await
    }

    /// Runs decode, filter, transform and deduplicate over one payload.
    pub async fn process(&self, payload: &[u8]) -> Outcome {
        let event: PaymentEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => return Outcome::DecodeFailed(e),
        };

        let topic = match self.filter(&event) {
            Some(topic) => topic.to_string(),
            None => {
                return Outcome::NoRoute {
                    status: event.status,
                }
            }
        };

        let projected = self.transform(&event);

        // A zero window disables deduplication entirely.
        if !self.window.is_zero() {
            match self.dedupe_key(&projected) {
                Some(key) => match self.deduplicate(&key).await {
                    Ok(true) => {}
                    Ok(false) => return Outcome::Duplicate { key },
                    Err(e) => return Outcome::StoreFailed(e),
                },
                None => {
                    warn!(
                        field = %self.dedupe_field,
                        "Dedup key field missing from projection, admitting record"
                    );
                }
            }
        }

        let payload = Value::Object(projected).to_string().into_bytes();
        Outcome::Admitted { topic, payload }
    }

    /// Stringifies the configured key field out of the projection.
    fn dedupe_key(&self, projected: &Map<String, Value>) -> Option<String> {
        match projected.get(&self.dedupe_field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
