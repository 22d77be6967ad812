use crate::config::parse::load_config;
use crate::config::types::{Config, KafkaConfig};
use crate::decode::{AvroDecoder, PassthroughDecoder, SchemaDecoder, SchemaRegistryClient};
use crate::fetch::{CleanupPolicy, MessageBrowser, PartitionFetcher};
use crate::kafka::{KafkaAdmin, KafkaError, RdKafkaAdmin, RdKafkaConsumerFactory};
use crate::web::{run_server, AppState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config not found, searched ~/.config/kafka-browser/config.yml and /etc/kafka-browser/config.yml; use --config <path> or run 'kafka-browser config init'")]
    ConfigNotFound,

    #[error("config error: {0}")]
    Config(#[from] crate::config::parse::ConfigError),

    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("schema registry error: {0}")]
    Registry(#[from] crate::decode::registry::RegistryError),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("web server error: {0}")]
    WebServer(#[from] std::io::Error),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), RunError> {
    let config_path = config_path.ok_or(RunError::ConfigNotFound)?;
    serve(&config_path).await
}

async fn serve(config_path: &Path) -> Result<(), RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;

    info!(brokers = ?config.kafka.brokers, "Connecting to Kafka");
    let admin: Arc<dyn KafkaAdmin> = Arc::new(RdKafkaAdmin::new(&config.kafka)?);
    connect_with_retry(admin.as_ref(), &config.kafka).await?;

    let (decoder, registry) = build_decoder(&config)?;
    let consumers = Arc::new(RdKafkaConsumerFactory::new(config.kafka.clone()));

    let fetcher = Arc::new(PartitionFetcher::new(
        consumers,
        admin.clone(),
        decoder,
        config.fetch.group_prefix.clone(),
        CleanupPolicy::from(&config.cleanup),
    ));
    let browser = Arc::new(MessageBrowser::new(
        admin.clone(),
        fetcher,
        config.fetch.cross_topic_timeout,
    ));

    let state = AppState {
        admin,
        browser,
        registry,
        fetch: config.fetch.clone(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    info!("Starting web server on {}", config.web.listen);
    let web_config = config.web.clone();
    let mut web_handle = tokio::spawn(async move { run_server(state, web_config, shutdown_rx).await });

    info!("Server started, press Ctrl+C to shutdown");

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
            web_handle.await??;
        }
        result = &mut web_handle => {
            match result {
                Ok(Ok(())) => info!("Web server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "Web server error");
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    info!("Shutdown complete");
    Ok(())
}

fn build_decoder(
    config: &Config,
) -> Result<(Arc<dyn SchemaDecoder>, Option<Arc<SchemaRegistryClient>>), RunError> {
    match &config.schema_registry {
        Some(registry_config) => {
            info!(url = %registry_config.url, "Using schema registry for Avro decoding");
            let registry = SchemaRegistryClient::new(registry_config)?;
            let decoder = AvroDecoder::new(registry.clone());
            Ok((Arc::new(decoder), Some(Arc::new(registry))))
        }
        None => {
            info!("No schema registry configured, payloads are shown as text");
            Ok((Arc::new(PassthroughDecoder), None))
        }
    }
}

/// Startup connect with exponential backoff, capped at 60s between attempts.
async fn connect_with_retry(admin: &dyn KafkaAdmin, config: &KafkaConfig) -> Result<(), KafkaError> {
    let mut attempts = 0;
    let mut backoff = config.connect_backoff;

    loop {
        match admin.connect().await {
            Ok(()) => {
                info!(attempts = attempts + 1, "Connected to Kafka");
                return Ok(());
            }
            Err(e) => {
                attempts += 1;
                if attempts >= config.connect_retries {
                    error!(attempts = attempts, error = %e, "Max connect retries exceeded");
                    return Err(e);
                }

                warn!(
                    attempt = attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Kafka connect failed, retrying"
                );

                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, Duration::from_secs(60));
            }
        }
    }
}
