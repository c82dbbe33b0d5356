//! Error types and result handling for topic-relay.
//!
//! This module defines the main error type [`Error`] and a convenience
//! [`Result`] type alias used throughout the crate.
//!
//! # Example
//!
//! ```rust
//! use topic_relay::{Error, Result};
//!
//! fn wait_for_store() -> Result<()> {
//!     // Simulating a health-check timeout
//!     Err(Error::Timeout {
//!         message: "store ping".to_string(),
//!     })
//! }
//!
//! match wait_for_store() {
//!     Ok(()) => println!("Store reachable"),
//!     Err(Error::Timeout { message }) => eprintln!("Timed out: {}", message),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use thiserror::Error;

/// The main error type for topic-relay operations.
///
/// This enum represents all possible errors that can occur while routing
/// messages, from configuration issues to runtime failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error from file parsing, environment overrides,
    /// or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Kafka consumer or producer error.
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// Idempotency store (Redis) error.
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// Operation timeout.
    #[error("Timeout error: {message}")]
    Timeout {
        /// Description of what timed out
        message: String,
    },
}

/// A convenient Result type alias for topic-relay operations.
///
/// This is equivalent to `std::result::Result<T, topic_relay::Error>`.
///
/// # Example
///
/// ```rust
/// use topic_relay::Result;
///
/// fn do_something() -> Result<String> {
///     Ok("Success".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;
