//! Logging (`tracing-subscriber`) and tracing (`opentelemetry_sdk`) setup.
//!
//! The tracer provider is never registered as the global one: take a tracer from
//! [`OtelGuard::tracer`] and pass it to the components that create spans.
//! Only the text-map propagator is global.
pub mod config;
pub mod formats;
pub mod resource;
pub mod traces;

pub use config::{Guard, LogFormat, LogTimer, TracingConfig, WriterConfig};
pub use resource::DetectResource;
pub use traces::{identity, OtelGuard, TraceExporterKind};

use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

use crate::Error;

/// Configure the global propagator based on content of the env variable [OTEL_PROPAGATORS](https://opentelemetry.io/docs/concepts/sdk-configuration/general-sdk-configuration/#otel_propagators)
/// Specifies Propagators to be used in a comma-separated list.
/// Default value: `"tracecontext,baggage"`
///
/// Accepted values for `OTEL_PROPAGATORS` are:
///
/// - "tracecontext": W3C Trace Context
/// - "baggage": W3C Baggage
/// - "none": No automatically configured propagator.
pub fn init_propagator() -> Result<(), Error> {
    let value_from_env =
        std::env::var("OTEL_PROPAGATORS").unwrap_or_else(|_| "tracecontext,baggage".to_string());
    let propagators: Vec<(Box<dyn TextMapPropagator + Send + Sync>, String)> = value_from_env
        .split(',')
        .map(|s| {
            let name = s.trim().to_lowercase();
            propagator_from_string(&name).map(|o| o.map(|b| (b, name)))
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .flatten()
        .collect();
    if !propagators.is_empty() {
        let (propagators_impl, propagators_name): (Vec<_>, Vec<_>) =
            propagators.into_iter().unzip();
        tracing::debug!(target: "otel::setup", OTEL_PROPAGATORS = propagators_name.join(","));
        let composite_propagator = TextMapCompositePropagator::new(propagators_impl);
        opentelemetry::global::set_text_map_propagator(composite_propagator);
    }
    Ok(())
}

fn propagator_from_string(v: &str) -> Result<Option<Box<dyn TextMapPropagator + Send + Sync>>, Error> {
    match v {
        "tracecontext" => Ok(Some(Box::new(TraceContextPropagator::new()))),
        "baggage" => Ok(Some(Box::new(BaggagePropagator::new()))),
        "none" => Ok(None),
        unknown => Err(Error::UnsupportedPropagator(unknown.to_string())),
    }
}
