use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use topic_relay::kafka::{RelayConsumer, RelayProducer};
use topic_relay::pipeline::Pipeline;
use topic_relay::store::{IdempotencyStore, RedisStore};
use topic_relay::{Config, Error, Result, Router};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "topic-relay")]
#[command(about = "Kafka topic-to-topic message router", long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[arg(short, long, help = "Enable JSON output for logs")]
    json_logs: bool,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs, args.verbose);

    info!("Starting topic-relay");
    info!("Loading configuration from {:?}", args.config);

    let config = match Config::from_file(&args.config) {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(Error::Config(e));
        }
    };

    info!(
        kafka_brokers = ?config.kafka.brokers,
        input_topic = %config.kafka.input_topic,
        group_id = %config.kafka.group_id,
        routes = config.routing.routes.len(),
        projection = ?config.routing.projection,
        dedup_key = %config.routing.deduplication.key,
        dedup_window_secs = config.routing.deduplication.window_secs,
        "Configuration summary"
    );

    let store = RedisStore::connect(&config.redis).await?;
    store.ping().await?;
    info!("Idempotency store reachable");

    let consumer = RelayConsumer::new(&config.kafka)?;
    let producer = RelayProducer::new(&config.kafka)?;
    let pipeline = Pipeline::new(&config.routing, Arc::new(store));

    let mut router = Router::new(
        Arc::new(consumer),
        Arc::new(producer),
        pipeline,
        Duration::from_millis(config.routing.poll_timeout_ms),
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received Ctrl+C, shutting down");
        signal_token.cancel();
    });

    let result = router.run(shutdown).await;

    let stats = router.stats();
    info!(
        published = stats.published,
        no_route = stats.no_route,
        duplicates = stats.duplicates,
        decode_errors = stats.decode_errors,
        store_errors = stats.store_errors,
        publish_errors = stats.publish_errors,
        "Relay finished"
    );

    result
}

fn init_logging(json: bool, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("topic_relay=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("topic_relay=info,warn"))
    };

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
