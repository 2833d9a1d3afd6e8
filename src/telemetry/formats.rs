//! One fmt layer per [`LogFormat`], configured from the same [`TracingConfig`].
//!
//! Only the formats built into `tracing-subscriber` are offered (no logfmt): `Json` for
//! log collectors, the others for humans.

use tracing::Subscriber;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::{time, uptime, Uptime};
use tracing_subscriber::{registry::LookupSpan, Layer};

use super::config::{FeatureSet, LogFormat, LogTimer, TracingConfig, WriterConfig};
use crate::Error;

pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

pub fn build_layer<S>(config: &TracingConfig) -> Result<BoxedLayer<S>, Error>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match config.format {
        LogFormat::Pretty => configure_layer(fmt::layer().pretty(), config),
        LogFormat::Json => configure_layer(fmt::layer().json(), config),
        LogFormat::Full => configure_layer(fmt::layer(), config),
        LogFormat::Compact => configure_layer(fmt::layer().compact(), config),
    }
}

fn configure_layer<S, N, L, T, W>(
    mut layer: fmt::Layer<S, N, fmt::format::Format<L, T>, W>,
    config: &TracingConfig,
) -> Result<BoxedLayer<S>, Error>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> fmt::FormatFields<'writer> + Send + Sync + 'static,
    L: Send + Sync + 'static,
    fmt::format::Format<L, ()>: fmt::FormatEvent<S, N>,
    fmt::format::Format<L, Uptime>: fmt::FormatEvent<S, N>,
    fmt::format::Format<L>: fmt::FormatEvent<S, N>,
    W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    // NOTE: Destructure to make sure we don’t miss a feature
    let FeatureSet {
        file_names,
        line_numbers,
        thread_names,
        span_events,
        target_display,
        timer,
    } = &config.features;

    layer = layer
        .with_file(*file_names)
        .with_line_number(*line_numbers)
        .with_thread_names(*thread_names)
        .with_span_events(span_events.clone().unwrap_or(FmtSpan::NONE))
        .with_target(*target_display);

    match timer {
        LogTimer::None => configure_writer(layer.without_time(), &config.writer),
        LogTimer::Time => configure_writer(layer.with_timer(time()), &config.writer),
        LogTimer::Uptime => configure_writer(layer.with_timer(uptime()), &config.writer),
    }
}

fn configure_writer<S, N, L, T, W>(
    layer: fmt::Layer<S, N, fmt::format::Format<L, T>, W>,
    writer: &WriterConfig,
) -> Result<BoxedLayer<S>, Error>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> fmt::FormatFields<'writer> + Send + Sync + 'static,
    L: Send + Sync + 'static,
    T: Send + Sync + 'static,
    fmt::format::Format<L, T>: fmt::FormatEvent<S, N>,
{
    match writer {
        WriterConfig::Stdout => Ok(Box::new(layer.with_writer(std::io::stdout))),
        WriterConfig::Stderr => Ok(Box::new(layer.with_writer(std::io::stderr))),
        WriterConfig::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Ok(Box::new(layer.with_writer(std::sync::Mutex::new(file))))
        }
    }
}
