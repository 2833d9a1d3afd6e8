use adservice_client::cli::Args;
use adservice_client::telemetry::{DetectResource, TracingConfig};
use adservice_client::{AdClient, Error, Transport, FETCH_ROUNDS};
use opentelemetry::trace::noop::NoopTracer;
use tracing::info;

const SERVICE_NAME: &str = "AdServiceClient";

fn main() -> Result<(), Error> {
    let guard = TracingConfig::default()
        .with_resource(
            DetectResource::default()
                .with_fallback_service_name(SERVICE_NAME)
                .with_fallback_service_version(env!("CARGO_PKG_VERSION")),
        )
        .init_subscriber()?;

    let args = Args::from_env();
    let builder = AdClient::builder(args.host, args.port).with_transport(Transport::from_env());
    // RPC failures are logged by `fetch_ads`, they don't change the exit status
    match &guard.otel_guard {
        Some(otel_guard) => run(builder.connect(otel_guard.tracer(SERVICE_NAME))?, &args.context_key),
        None => run(builder.connect(NoopTracer::new())?, &args.context_key),
    }

    info!("Exiting AdServiceClient...");
    // flush the remaining spans
    drop(guard);
    Ok(())
}

fn run<T>(client: AdClient<T>, context_key: &str)
where
    T: opentelemetry::trace::Tracer,
    T::Span: Send + Sync + 'static,
{
    for _ in 0..FETCH_ROUNDS {
        client.fetch_ads(context_key);
    }
    client.shutdown();
}
