use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

/// Keeps the tracer provider alive until the run is over.
pub struct TracingGuard {
    provider: SdkTracerProvider,
}

impl TracingGuard {
    /// Flush pending spans and stop the exporter.
    pub fn shutdown(self) {
        if let Err(e) = self.provider.shutdown() {
            eprintln!("Failed to shut down tracer provider: {e}");
        }
    }
}

/// Installs the global subscriber: a compact stderr fmt layer driven by
/// `RUST_LOG`, plus an OpenTelemetry layer. Spans are only exported when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set (gRPC, e.g. port 4317).
pub fn init_tracing(service_name: &str) -> anyhow::Result<TracingGuard> {
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    let mut builder = SdkTracerProvider::builder().with_resource(resource);
    if let Ok(otlp_endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(otlp_endpoint)
            .build()?;
        // a batch exporter is recommended as the simple exporter will export each span synchronously on dropping
        builder = builder.with_batch_exporter(exporter);
    }
    let tracer_provider = builder.build();

    opentelemetry::global::set_tracer_provider(tracer_provider.clone());

    // Filter the tracing layer - only our own spans and the http client are worth exporting
    let tracing_level_filter = tracing_subscriber::filter::Targets::new()
        .with_target("otel_validator", tracing::Level::TRACE)
        .with_target("reqwest", tracing::Level::DEBUG)
        .with_target("hyper_util", tracing::Level::INFO)
        .with_target("h2", tracing::Level::WARN)
        .with_default(tracing::Level::INFO);

    let tracing_opentelemetry_layer = tracing_opentelemetry::layer()
        .with_tracer(tracer_provider.tracer("otel-validator"))
        .with_filter(tracing_level_filter);

    // The check report owns stdout, diagnostics go to stderr
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_writer(std::io::stderr);

    let subscriber = tracing_subscriber::Registry::default()
        .with(fmt_layer.with_filter(tracing_subscriber::EnvFilter::from_default_env()))
        .with(tracing_opentelemetry_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(TracingGuard {
        provider: tracer_provider,
    })
}
