pub mod consumer;
pub mod producer;

pub use consumer::RelayConsumer;
pub use producer::RelayProducer;
