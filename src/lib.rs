pub mod config;
pub mod error;
pub mod message;
pub mod pipeline;
pub mod router;

pub mod kafka;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use router::Router;
