//! Concept aggregation service.
//!
//! Consumes concept-update notifications from SQS, merges every
//! concorded source representation into a canonical concept and fans
//! the result out to the graph writer, cache purger, search writer,
//! event queue and notification stream. Provides an admin API for
//! on-demand aggregation, forced sends and health probes.
//!
//! Set `CAS_AWS_ENDPOINT` to point every AWS client at LocalStack for
//! local development.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use aws_config::{BehaviorVersion, Region};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use cas_aggregate::api::{create_router, ApiState};
use cas_aggregate::health::NotificationQueueCheck;
use cas_aggregate::{
    AuthorityPolicy, CachePurger, ConceptAggregator, ConceptPipeline, GraphWriter,
    HealthAggregator, HealthGate, HttpConcordanceResolver, KinesisStreamAppender, ReadinessCheck,
    S3SourceStore, SearchWriter, TypeRegistry, WorkerPool,
};
use cas_config::ConfigLoader;
use cas_queue::sqs::{SqsEventPublisher, SqsNotificationConsumer};
use cas_queue::{EventPublisher, NotificationConsumer};

/// How often the aggregate health verdict is fed into the gate.
const HEALTH_FEED_INTERVAL: Duration = Duration::from_secs(3);

/// How long to wait for in-flight messages once shutdown is requested.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for local development)
    let _ = dotenvy::dotenv();

    cas_common::logging::init_logging("cas-server");

    info!("Starting concept aggregation service");

    let config = ConfigLoader::new().load()?;
    config.validate()?;

    // 1. AWS clients, one shared config per configured region
    let sqs_client = aws_sdk_sqs::Client::new(&aws_conf(&config.notifications.region).await);
    let events_client = aws_sdk_sqs::Client::new(&aws_conf(&config.events.region).await);
    let s3_client = aws_sdk_s3::Client::new(&aws_conf(&config.store.region).await);
    let kinesis_client = aws_sdk_kinesis::Client::new(&aws_conf(&config.stream.region).await);

    // 2. Shared HTTP client for every sink; the per-message deadline
    // governs overall latency, this only bounds a single call.
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.workers.message_timeout_secs))
        .connect_timeout(Duration::from_secs(5))
        .build()?;

    // 3. Upstream clients
    let consumer: Arc<SqsNotificationConsumer> = Arc::new(
        SqsNotificationConsumer::new(
            sqs_client,
            config.notifications.queue_url.clone(),
            config.notifications.visibility_timeout_secs as i32,
        )
        .with_wait_time_seconds(config.notifications.wait_time_secs as i32)
        .with_max_messages(config.notifications.max_messages),
    );
    let resolver = Arc::new(HttpConcordanceResolver::new(
        http_client.clone(),
        &config.concordances.base_url,
        &config.authorities.primary,
    ));
    let store = Arc::new(S3SourceStore::new(s3_client, &config.store.bucket));

    // 4. Sinks
    let graph_writer = Arc::new(GraphWriter::new(
        http_client.clone(),
        &config.graph_writer.base_url,
    ));
    let search_writer = Arc::new(SearchWriter::new(
        http_client.clone(),
        &config.search_writer.base_url,
    ));
    let purger = Arc::new(CachePurger::new(http_client.clone(), &config.purger.base_url));
    let events: Arc<dyn EventPublisher> = Arc::new(SqsEventPublisher::new(
        events_client,
        config.events.queue_url.clone(),
    ));
    let stream = Arc::new(KinesisStreamAppender::new(
        kinesis_client,
        &config.stream.name,
    ));

    // 5. Pipeline
    let policy = AuthorityPolicy {
        primary: config.authorities.primary.clone(),
        secondary: config.authorities.secondary.clone(),
        wiki: config.authorities.wiki.clone(),
        legacy_tags: config.authorities.legacy_tags.clone(),
    };
    let registry = TypeRegistry::new(
        config.authorities.curated.clone(),
        config.public_types.clone(),
    );
    let aggregator = ConceptAggregator::new(resolver.clone(), store.clone(), policy);
    let pipeline = Arc::new(ConceptPipeline::new(
        aggregator,
        graph_writer.clone(),
        search_writer.clone(),
        purger.clone(),
        events,
        stream.clone(),
        registry,
    ));

    // 6. Composite readiness across every external dependency
    let health = Arc::new(HealthAggregator::new(vec![
        Arc::new(NotificationQueueCheck::new(
            consumer.clone() as Arc<dyn NotificationConsumer>
        )),
        store.clone() as Arc<dyn ReadinessCheck>,
        resolver.clone() as Arc<dyn ReadinessCheck>,
        graph_writer as Arc<dyn ReadinessCheck>,
        search_writer as Arc<dyn ReadinessCheck>,
        purger as Arc<dyn ReadinessCheck>,
        stream as Arc<dyn ReadinessCheck>,
    ]));

    // 7. Health gate: the lifecycle controller owns both channel senders
    let gate = HealthGate::new();
    let (health_tx, health_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let _gate_listener = gate.listen(health_rx, shutdown_rx);

    // Feed the aggregate verdict into the gate on an interval
    {
        let health = health.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(HEALTH_FEED_INTERVAL);
            loop {
                ticker.tick().await;
                let verdict = health.healthy().await;
                if health_tx.send(verdict).await.is_err() {
                    break;
                }
            }
        });
    }

    // 8. Worker pool
    let pool = Arc::new(WorkerPool::new(
        consumer.clone() as Arc<dyn NotificationConsumer>,
        pipeline.clone(),
        gate.clone(),
        config.workers.count,
        Duration::from_secs(config.workers.message_timeout_secs),
    ));
    let pool_handle = {
        let pool = pool.clone();
        tokio::spawn(async move {
            pool.run().await;
        })
    };

    // 9. Admin HTTP server
    let mut app = create_router(ApiState {
        pipeline: pipeline.clone(),
        health: health.clone(),
    });
    if config.http.request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    let addr = format!("{}:{}", config.http.host, config.http.port);
    info!(addr = %addr, workers = config.workers.count, "Service started");
    let listener = TcpListener::bind(&addr).await?;
    let server_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Admin server failed");
        }
    });

    // 10. Wait for shutdown, then drain
    shutdown_signal().await;
    info!("Shutdown signal received, draining workers...");

    let _ = shutdown_tx.send(());
    consumer.stop().await;

    match tokio::time::timeout(DRAIN_TIMEOUT, pool_handle).await {
        Ok(_) => info!("Workers drained"),
        Err(_) => warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "Workers did not drain in time; in-flight messages will redeliver"
        ),
    }

    server_task.abort();
    info!("Concept aggregation service stopped");
    Ok(())
}

async fn aws_conf(region: &str) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()));
    if let Ok(endpoint) = std::env::var("CAS_AWS_ENDPOINT") {
        info!(endpoint = %endpoint, "Using AWS endpoint override");
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
