use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_otlp::{Protocol, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{SERVICE_NAME, SERVICE_VERSION},
    resource::DEPLOYMENT_ENVIRONMENT_NAME,
};
use rocket::{
    Data, Request, Response,
    fairing::{Fairing, Info, Kind},
};
use std::time::Instant;
use tonic::metadata::MetadataMap;
use tracing::info_span;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::env::AppConfig;

pub struct TelemetryFairing;

#[rocket::async_trait]
impl Fairing for TelemetryFairing {
    fn info(&self) -> Info {
        Info {
            name: "OpenTelemetry",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let method = request.method().to_string();
        let uri = request.uri().to_string();

        let start_time = Instant::now();

        let span = info_span!(
            "http_request",
            otel.name = format!("{} {}", method, uri),
            http.method = method,
            http.uri = uri,
            http.status_code = tracing::field::Empty,
            http.duration_ms = tracing::field::Empty,
        );

        request.local_cache(|| (span, start_time));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let (span, start_time) = request.local_cache(|| {
            let span = info_span!("http_request");
            (span, Instant::now())
        });

        let duration = start_time.elapsed();

        span.record("http.status_code", response.status().code);
        span.record("http.duration_ms", duration.as_millis() as i64);

        let _entered = span.enter();
        tracing::info!(
            "Completed request in {}ms with status {}",
            duration.as_millis(),
            response.status().code
        );
    }
}

fn resource() -> Resource {
    let environment = dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string());

    Resource::builder()
        .with_schema_url(
            [
                KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, environment),
            ],
            SCHEMA_URL,
        )
        .build()
}

fn init_tracer_provider(
    endpoint: &str,
    api_key: Option<&str>,
) -> Result<SdkTracerProvider, Box<dyn std::error::Error>> {
    let mut metadata = MetadataMap::new();
    if let Some(key) = api_key {
        metadata.insert("x-api-key", key.parse()?);
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_tls_config(tonic::transport::ClientTlsConfig::new().with_native_roots())
        .with_protocol(Protocol::Grpc)
        .with_metadata(metadata)
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource())
        .with_batch_exporter(exporter)
        .build();

    Ok(tracer_provider)
}

pub struct OtelGuard {
    tracer_provider: SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(err) = self.tracer_provider.shutdown() {
            eprintln!("Failed to shut down tracer provider: {:?}", err);
        }
    }
}

/// Installs the global subscriber. Spans are exported only when an OTLP
/// endpoint is configured; the returned guard flushes them on drop.
pub fn init_tracing(config: &AppConfig) -> Option<OtelGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        let _ = registry.try_init();
        return None;
    };

    match init_tracer_provider(endpoint, config.otlp_api_key.as_deref()) {
        Ok(tracer_provider) => {
            let tracer = tracer_provider.tracer(env!("CARGO_PKG_NAME"));
            let _ = registry.with(OpenTelemetryLayer::new(tracer)).try_init();
            tracing::info!(endpoint = %endpoint, "Exporting traces over OTLP");

            Some(OtelGuard { tracer_provider })
        }
        Err(err) => {
            let _ = registry.try_init();
            tracing::error!(error = %err, "Failed to set up OTLP exporter, traces stay local");
            None
        }
    }
}
