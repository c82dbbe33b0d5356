use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub kafka: KafkaConfig,
    pub redis: RedisConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub group_id: String,
    pub input_topic: String,
    #[serde(default = "default_auto_offset_reset")]
    pub auto_offset_reset: String,
    #[serde(default = "default_compression")]
    pub compression: String,
    #[serde(default = "default_acks")]
    pub acks: String,
    #[serde(default = "default_linger_ms")]
    pub linger_ms: u32,
    #[serde(default = "default_message_timeout_ms")]
    pub message_timeout_ms: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default)]
    pub routes: Vec<RouteRule>,
    #[serde(default)]
    pub projection: Vec<String>,
    #[serde(default)]
    pub deduplication: DedupeConfig,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout_ms(),
            routes: Vec::new(),
            projection: Vec::new(),
            deduplication: DedupeConfig::default(),
        }
    }
}

/// Maps one status marker to the topic its messages are republished to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteRule {
    pub status: String,
    pub topic: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DedupeConfig {
    /// Projected field whose value keys the duplicate check.
    #[serde(default)]
    pub key: String,
    /// Suppression window in seconds. Zero disables deduplication.
    #[serde(default)]
    pub window_secs: u64,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("RELAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.kafka.brokers.is_empty() {
            return Err(config::ConfigError::Message(
                "kafka.brokers must list at least one broker".to_string(),
            ));
        }
        if self.kafka.group_id.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "kafka.group_id must not be empty".to_string(),
            ));
        }
        if self.kafka.input_topic.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "kafka.input_topic must not be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for rule in &self.routing.routes {
            // Status markers are opaque (empty included), topics are not.
            if rule.topic.trim().is_empty() {
                return Err(config::ConfigError::Message(format!(
                    "routing.routes entry for status '{}' has no topic",
                    rule.status
                )));
            }
            if !seen.insert(rule.status.as_str()) {
                return Err(config::ConfigError::Message(format!(
                    "routing.routes maps status '{}' more than once",
                    rule.status
                )));
            }
        }

        let dedup = &self.routing.deduplication;
        if dedup.window_secs > 0 && dedup.key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "routing.deduplication.key must be set when window_secs > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_auto_offset_reset() -> String {
    "earliest".to_string()
}

fn default_compression() -> String {
    "snappy".to_string()
}

fn default_acks() -> String {
    "all".to_string()
}

fn default_linger_ms() -> u32 {
    0
}

fn default_message_timeout_ms() -> u32 {
    30_000
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_poll_timeout_ms() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL: &str = r#"
        [kafka]
        brokers = ["localhost:9092"]
        group_id = "relay"
        input_topic = "payments"

        [redis]
        url = "redis://localhost:6379/0"
    "#;

    #[test]
    fn test_minimal_config_applies_defaults() {
        let file = write_config(MINIMAL);
        let cfg = Config::from_file(file.path()).unwrap();

        assert_eq!(cfg.kafka.auto_offset_reset, "earliest");
        assert_eq!(cfg.kafka.compression, "snappy");
        assert_eq!(cfg.kafka.acks, "all");
        assert_eq!(cfg.kafka.linger_ms, 0);
        assert_eq!(cfg.kafka.message_timeout_ms, 30_000);
        assert_eq!(cfg.redis.connect_timeout_secs, 5);
        assert_eq!(cfg.routing.poll_timeout_ms, 100);
        assert!(cfg.routing.routes.is_empty());
        assert!(cfg.routing.projection.is_empty());
        assert_eq!(cfg.routing.deduplication.window_secs, 0);
    }

    #[test]
    fn test_full_routing_section() {
        let file = write_config(
            r#"
            [kafka]
            brokers = ["k1:9092", "k2:9092"]
            group_id = "relay"
            input_topic = "payments"

            [redis]
            url = "redis://localhost:6379/0"

            [routing]
            poll_timeout_ms = 250
            projection = ["id", "payment"]

            [[routing.routes]]
            status = "STD"
            topic = "standard"

            [[routing.routes]]
            status = "PAY"
            topic = "paid"

            [routing.deduplication]
            key = "id"
            window_secs = 600
        "#,
        );
        let cfg = Config::from_file(file.path()).unwrap();

        assert_eq!(cfg.kafka.brokers.len(), 2);
        assert_eq!(cfg.routing.poll_timeout_ms, 250);
        assert_eq!(cfg.routing.projection, vec!["id", "payment"]);
        assert_eq!(cfg.routing.routes[0].status, "STD");
        assert_eq!(cfg.routing.routes[0].topic, "standard");
        assert_eq!(cfg.routing.routes[1].topic, "paid");
        assert_eq!(cfg.routing.deduplication.key, "id");
        assert_eq!(cfg.routing.deduplication.window_secs, 600);
    }

    #[test]
    fn test_rejects_duplicate_route_status() {
        let file = write_config(
            r#"
            [kafka]
            brokers = ["localhost:9092"]
            group_id = "relay"
            input_topic = "payments"

            [redis]
            url = "redis://localhost:6379/0"

            [[routing.routes]]
            status = "STD"
            topic = "standard"

            [[routing.routes]]
            status = "STD"
            topic = "other"
        "#,
        );
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_rejects_empty_brokers() {
        let file = write_config(
            r#"
            [kafka]
            brokers = []
            group_id = "relay"
            input_topic = "payments"

            [redis]
            url = "redis://localhost:6379/0"
        "#,
        );
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_rejects_dedup_window_without_key() {
        let file = write_config(
            r#"
            [kafka]
            brokers = ["localhost:9092"]
            group_id = "relay"
            input_topic = "payments"

            [redis]
            url = "redis://localhost:6379/0"

            [routing.deduplication]
            window_secs = 60
        "#,
        );
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("deduplication.key"));
    }

    #[test]
    fn test_rejects_route_without_topic() {
        let file = write_config(
            r#"
            [kafka]
            brokers = ["localhost:9092"]
            group_id = "relay"
            input_topic = "payments"

            [redis]
            url = "redis://localhost:6379/0"

            [[routing.routes]]
            status = "STD"
            topic = ""
        "#,
        );
        assert!(Config::from_file(file.path()).is_err());
    }
}
