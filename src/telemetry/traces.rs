use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider, TracerProviderBuilder};
use opentelemetry_sdk::Resource;

use crate::Error;

#[must_use = "Recommend holding with 'let _guard = ' pattern to ensure final traces are sent to the server"]
/// On Drop of the `OtelGuard` instance,
/// the wrapped Tracer Provider is force to flush and to shutdown (ignoring error).
pub struct OtelGuard {
    pub tracer_provider: SdkTracerProvider,
}

impl OtelGuard {
    /// Tracer to hand over to instrumented components (eg `AdClient::connect`).
    #[must_use]
    pub fn tracer(&self, name: &'static str) -> SdkTracer {
        self.tracer_provider.tracer(name)
    }
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        let _ = self.tracer_provider.force_flush();
        let _ = self.tracer_provider.shutdown();
    }
}

/// Where finished spans go, from [`OTEL_TRACES_EXPORTER`](https://opentelemetry.io/docs/specs/otel/configuration/sdk-environment-variables/#exporter-selection).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceExporterKind {
    #[default]
    Otlp,
    Stdout,
    None,
}

impl TraceExporterKind {
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("OTEL_TRACES_EXPORTER")
            .map(|v| Self::from_name(&v))
            .unwrap_or_default()
    }

    fn from_name(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "otlp" | "" => TraceExporterKind::Otlp,
            "console" | "stdout" => TraceExporterKind::Stdout,
            "none" => TraceExporterKind::None,
            x => {
                tracing::warn!("unknown '{x}' for OTEL_TRACES_EXPORTER; fallback to otlp");
                TraceExporterKind::Otlp
            }
        }
    }
}

#[must_use]
pub fn identity(v: TracerProviderBuilder) -> TracerProviderBuilder {
    v
}

// see https://opentelemetry.io/docs/reference/specification/protocol/exporter/
pub fn init_tracerprovider<F>(
    kind: TraceExporterKind,
    resource: Resource,
    transform: F,
) -> Result<SdkTracerProvider, Error>
where
    F: FnOnce(TracerProviderBuilder) -> TracerProviderBuilder,
{
    debug_env();
    let mut trace_provider = SdkTracerProvider::builder().with_resource(resource);
    match kind {
        TraceExporterKind::Otlp => {
            if let Some(exporter) = build_otlp_exporter()? {
                trace_provider = trace_provider.with_batch_exporter(exporter);
            }
        }
        TraceExporterKind::Stdout => {
            trace_provider =
                trace_provider.with_simple_exporter(opentelemetry_stdout::SpanExporter::default());
        }
        TraceExporterKind::None => {
            tracing::debug!(target: "otel::setup", "OTEL_TRACES_EXPORTER=none; spans are created but not exported");
        }
    }
    trace_provider = transform(trace_provider);
    Ok(trace_provider.build())
}

// the exporter runs on the batch processor thread, without async runtime, so only the
// blocking http client is available
fn build_otlp_exporter() -> Result<Option<SpanExporter>, Error> {
    let (maybe_protocol, maybe_endpoint) = read_protocol_and_endpoint_from_env();
    let protocol = infer_protocol(maybe_protocol.as_deref(), maybe_endpoint.as_deref());
    match protocol.as_deref() {
        Some("http/protobuf") => Ok(Some(SpanExporter::builder().with_http().build()?)),
        Some(x) => {
            tracing::warn!("unsupported '{x}' env var set or infered for OTEL_EXPORTER_OTLP_TRACES_PROTOCOL or OTEL_EXPORTER_OTLP_PROTOCOL; no span exporter will be created");
            Ok(None)
        }
        None => {
            tracing::warn!("no env var set or infered for OTEL_EXPORTER_OTLP_TRACES_PROTOCOL or OTEL_EXPORTER_OTLP_PROTOCOL; no span exporter will be created");
            Ok(None)
        }
    }
}

pub fn debug_env() {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("OTEL_"))
        .for_each(|(k, v)| tracing::debug!(target: "otel::setup::env", key = %k, value = %v));
}

fn read_protocol_and_endpoint_from_env() -> (Option<String>, Option<String>) {
    let maybe_protocol = std::env::var("OTEL_EXPORTER_OTLP_TRACES_PROTOCOL")
        .or_else(|_| std::env::var("OTEL_EXPORTER_OTLP_PROTOCOL"))
        .ok();
    let maybe_endpoint = std::env::var("OTEL_EXPORTER_OTLP_TRACES_ENDPOINT")
        .or_else(|_| std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
        .ok();
    (maybe_protocol, maybe_endpoint)
}

pub(crate) fn infer_protocol(
    maybe_protocol: Option<&str>,
    maybe_endpoint: Option<&str>,
) -> Option<String> {
    match (maybe_protocol, maybe_endpoint) {
        (Some(protocol), _) => Some(protocol.to_string()),
        (None, Some(endpoint)) => {
            if endpoint.contains(":4317") {
                Some("grpc".to_string())
            } else {
                Some("http/protobuf".to_string())
            }
        }
        _ => None,
    }
}
