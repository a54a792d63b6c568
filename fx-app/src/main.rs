//! # FX Series Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Export traces and HTTP metrics over OTLP
//! - Build the upstream client and the series cache
//! - Create the rate service and dispatcher
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::{
    metrics::SdkMeterProvider, propagation::TraceContextPropagator, trace as sdktrace,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fx_cache::SeriesCache;
use fx_client::ExchangeRateClient;
use fx_hex::{Dispatcher, RateService, inbound::HttpServer};

/// OTLP providers installed globally; flushed on exit.
struct Telemetry {
    tracer_provider: sdktrace::SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    /// Installs OTLP span and metric exporters as the global providers.
    ///
    /// The collector endpoint comes from the standard `OTEL_EXPORTER_OTLP_*`
    /// variables.
    fn init() -> anyhow::Result<(sdktrace::Tracer, Self)> {
        global::set_text_map_propagator(TraceContextPropagator::new());

        // gRPC exporters with batch processing (non-blocking)
        let span_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .build()?;
        let tracer_provider = sdktrace::SdkTracerProvider::builder()
            .with_batch_exporter(span_exporter)
            .build();
        global::set_tracer_provider(tracer_provider.clone());

        let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .build()?;
        let meter_provider = SdkMeterProvider::builder()
            .with_periodic_exporter(metric_exporter)
            .build();
        global::set_meter_provider(meter_provider.clone());

        use opentelemetry::trace::TracerProvider as _;
        let tracer = tracer_provider.tracer("fx-series-service");

        Ok((
            tracer,
            Self {
                tracer_provider,
                meter_provider,
            },
        ))
    }

    fn shutdown(self) {
        if let Err(e) = self.tracer_provider.shutdown() {
            tracing::warn!("failed to flush traces: {}", e);
        }
        if let Err(e) = self.meter_provider.shutdown() {
            tracing::warn!("failed to flush metrics: {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize OpenTelemetry export
    let (otel_tracer, telemetry) = Telemetry::init()?;
    let otel_layer = tracing_opentelemetry::layer().with_tracer(otel_tracer);

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fx_app=debug,fx_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting fx server on port {}", config.port);
    tracing::info!("Using upstream: {}", config.upstream_url);

    let client = ExchangeRateClient::new(&config.upstream_url);
    let cache = Arc::new(SeriesCache::new(config.cache));

    let mut service = RateService::new(client, cache);
    if config.single_flight {
        tracing::info!("Single-flight fetching enabled");
        service = service.with_single_flight();
    }

    let dispatcher = Dispatcher::new(Arc::new(service)).with_timeout(config.query_timeout);

    // Create and run the HTTP server
    let server = HttpServer::new(dispatcher);
    let addr = format!("0.0.0.0:{}", config.port);

    let result = server.run(&addr).await;

    // Flush pending spans and metrics before exit
    telemetry.shutdown();
    result
}
