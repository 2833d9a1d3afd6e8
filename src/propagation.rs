use opentelemetry::propagation::{Injector, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue, MetadataMap};

/// Write side of the text-map propagation into gRPC request metadata.
pub struct MetadataInjector<'a>(pub &'a mut MetadataMap);

impl Injector for MetadataInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        // entries that are not valid ascii metadata are dropped
        if let (Ok(key), Ok(value)) = (
            AsciiMetadataKey::from_bytes(key.as_bytes()),
            AsciiMetadataValue::try_from(value.as_str()),
        ) {
            self.0.insert(key, value);
        }
    }
}

/// Inject `context` into `metadata` with the global propagator (see `telemetry::init_propagator`).
pub fn inject_context(context: &Context, metadata: &mut MetadataMap) {
    opentelemetry::global::get_text_map_propagator(|propagator| {
        inject_context_with(propagator, context, metadata);
    });
}

pub fn inject_context_with(
    propagator: &dyn TextMapPropagator,
    context: &Context,
    metadata: &mut MetadataMap,
) {
    propagator.inject_context(context, &mut MetadataInjector(metadata));
}

#[inline]
#[must_use]
pub fn find_trace_id(context: &Context) -> Option<String> {
    let span = context.span();
    let span_context = span.span_context();
    span_context
        .is_valid()
        .then(|| span_context.trace_id().to_string())
}
