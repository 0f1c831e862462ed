//! Tracing setup and per-request logging.
//!
//! Three sinks are always installed: a compact console layer, a daily
//! rolling file of errors and a daily rolling JSON file. An OTLP exporter is
//! added when the pipeline can be built; otherwise the service logs locally
//! only.

use std::fs;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{Config, RandomIdGenerator, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing::{Instrument, Level, Span, error, field, info, info_span, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_DIR: &str = "storage/logs";
const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

/// Where logs go, read from `LOG_DIR`, `ENVIRONMENT` and
/// `OTEL_EXPORTER_OTLP_ENDPOINT`.
#[derive(Debug, Clone)]
struct LogSettings {
    dir: String,
    environment: String,
    otlp_endpoint: String,
}

impl LogSettings {
    fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Self {
            dir: var("LOG_DIR", DEFAULT_LOG_DIR),
            environment: var("ENVIRONMENT", "development"),
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT", DEFAULT_OTLP_ENDPOINT),
        }
    }
}

/// `(module, function)` of an API path, if it is one.
fn api_target(path: &str) -> (Option<&str>, Option<&str>) {
    let mut segments = path.trim_start_matches('/').split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some("api"), Some(module), function) if !module.is_empty() => {
            (Some(module), function.filter(|f| !f.is_empty()))
        }
        _ => (None, None),
    }
}

fn completion_level(status: u16) -> Level {
    match status {
        500..=599 => Level::ERROR,
        400..=499 => Level::WARN,
        _ => Level::INFO,
    }
}

/// Wraps every request in an `http_request` span carrying a request id and,
/// for API calls, the addressed module.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let path = req.uri().path().to_string();
    let (module, segment) = api_target(&path);

    let span = info_span!(
        "http_request",
        request_id = %uuid::Uuid::new_v4(),
        method = %req.method(),
        path = %path,
        module = module.unwrap_or("-"),
        segment = segment.unwrap_or("-"),
        status = field::Empty,
    );

    let response = next.run(req).instrument(span.clone()).await;
    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis() as u64;
    span.record("status", status);

    log_completion(&span, status, latency_ms);

    response
}

fn log_completion(span: &Span, status: u16, latency_ms: u64) {
    let _entered = span.enter();
    match completion_level(status) {
        Level::ERROR => error!(status, latency_ms, "Server error"),
        Level::WARN => warn!(status, latency_ms, "Client error"),
        _ => info!(status, latency_ms, "Request completed"),
    }
}

fn init_tracer(service_name: &str, settings: &LogSettings) -> Result<Tracer, TraceError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, service_name.to_string()),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new("environment", settings.environment.clone()),
    ]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(settings.otlp_endpoint.clone()),
        )
        .with_trace_config(
            Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=info,scholaris_cache=info,tower_http=warn,hyper=info,tonic=info",
            env!("CARGO_CRATE_NAME")
        ))
    })
}

/// Installs the global subscriber. `service_name` names the log files and
/// the OTLP resource.
pub fn init_tracing(service_name: &str) -> anyhow::Result<()> {
    let settings = LogSettings::from_env();
    fs::create_dir_all(&settings.dir)?;

    let console = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(default_filter());

    let errors = fmt::layer()
        .with_writer(RollingFileAppender::new(
            Rotation::DAILY,
            &settings.dir,
            format!("{}.log", service_name),
        ))
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(EnvFilter::new("error"));

    let json = fmt::layer()
        .json()
        .with_writer(RollingFileAppender::new(
            Rotation::DAILY,
            &settings.dir,
            format!("{}.json", service_name),
        ))
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    let tracer = init_tracer(service_name, &settings);
    let otel_error = tracer.as_ref().err().map(ToString::to_string);
    let otel = tracer
        .ok()
        .map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(console)
        .with(errors)
        .with(json)
        .with(otel)
        .try_init()?;

    match otel_error {
        None => info!(endpoint = %settings.otlp_endpoint, "Tracing initialized with OTLP export"),
        Some(e) => warn!(error = %e, "Tracing initialized without OTLP export"),
    }

    Ok(())
}

pub async fn shutdown_tracer() {
    info!("Flushing traces");
    global::shutdown_tracer_provider();
}
