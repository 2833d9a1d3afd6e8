use std::borrow::Cow;

use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer};
use opentelemetry::{Context, ContextGuard, KeyValue};

use crate::status::CallStatus;

pub const RPC_SYSTEM: &str = "rpc.system";
pub const RPC_SERVICE: &str = "rpc.service";
pub const RPC_METHOD: &str = "rpc.method";
pub const RPC_GRPC_STATUS_CODE: &str = "rpc.grpc.status_code";

/// Span of one outgoing gRPC call, current for as long as the guard lives.
///
/// The span is ended when the guard is dropped, so every exit path of the
/// caller (early return, `?`, unwinding) closes it exactly once.
pub struct CallSpan {
    context: Context,
    _attached: ContextGuard,
}

impl CallSpan {
    pub fn start<T>(tracer: &T, service: &'static str, method: &'static str) -> Self
    where
        T: Tracer,
        T::Span: Send + Sync + 'static,
    {
        let span = tracer
            .span_builder(format!("{service}/{method}"))
            .with_kind(SpanKind::Client)
            .with_attributes([
                KeyValue::new(RPC_SYSTEM, "grpc"),
                KeyValue::new(RPC_SERVICE, service),
                KeyValue::new(RPC_METHOD, method),
            ])
            .start(tracer);
        let context = Context::current_with_span(span);
        let attached = context.clone().attach();
        Self {
            context,
            _attached: attached,
        }
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn add_event(&self, name: impl Into<Cow<'static, str>>) {
        self.context.span().add_event(name, vec![]);
    }

    pub fn record_grpc_code(&self, code: tonic::Code) {
        self.context
            .span()
            .set_attribute(KeyValue::new(RPC_GRPC_STATUS_CODE, i64::from(i32::from(code))));
    }

    pub fn set_status(&self, status: CallStatus) {
        self.context.span().set_status(status.into());
    }
}

impl Drop for CallSpan {
    fn drop(&mut self) {
        // `_attached` is dropped after this, restoring the previous current context
        self.context.span().end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use opentelemetry::trace::{Status, TracerProvider as _};
    use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};

    fn provider() -> (SdkTracerProvider, InMemorySpanExporter) {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (provider, exporter)
    }

    #[test]
    fn span_is_current_while_guard_lives() {
        let (provider, _exporter) = provider();
        let tracer = provider.tracer("test");
        let call = CallSpan::start(&tracer, "svc.Service", "Method");
        check!(Context::current().span().span_context() == call.context().span().span_context());
        drop(call);
        check!(!Context::current().span().span_context().is_valid());
    }

    #[test]
    fn span_is_ended_once_on_drop() {
        let (provider, exporter) = provider();
        let tracer = provider.tracer("test");
        {
            let call = CallSpan::start(&tracer, "svc.Service", "Method");
            call.add_event("first");
            call.record_grpc_code(tonic::Code::NotFound);
            call.set_status(CallStatus::Unknown {
                description: "missing".to_owned(),
            });
        }
        let spans = exporter.get_finished_spans().unwrap();
        let_assert!([span] = spans.as_slice());
        check!(span.name == "svc.Service/Method");
        check!(span.span_kind == SpanKind::Client);
        check!(
            span.status
                == Status::Error {
                    description: "missing".into()
                }
        );
        check!(span
            .attributes
            .contains(&KeyValue::new(RPC_GRPC_STATUS_CODE, 5_i64)));
        check!(span.events.iter().map(|e| e.name.as_ref()).collect::<Vec<_>>() == ["first"]);
    }

    #[test]
    fn span_is_ended_when_unwinding() {
        let (provider, exporter) = provider();
        let tracer = provider.tracer("test");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _call = CallSpan::start(&tracer, "svc.Service", "Method");
            panic!("unexpected");
        }));
        check!(result.is_err());
        check!(exporter.get_finished_spans().unwrap().len() == 1);
    }
}
