#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SetGlobalDefaultError(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error(transparent)]
    FilterParseError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    ExporterBuildError(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("unsupported propagator from env OTEL_PROPAGATORS: '{0}'")]
    UnsupportedPropagator(String),

    /// The channel to the Ads service can not be configured (bad uri, tls setup, ...).
    #[error("connection to the ads service: {0}")]
    ConnectionError(#[from] tonic::transport::Error),
}
