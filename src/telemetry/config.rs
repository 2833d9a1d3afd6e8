//! Builder for the logging + tracing setup of the process.
//!
//! ```no_run
//! use adservice_client::telemetry::TracingConfig;
//!
//! let guard = TracingConfig::default()
//!     .with_json_format()
//!     .with_stderr()
//!     .with_log_directives("debug")
//!     .init_subscriber()?;
//! let _tracer = guard.otel_guard.as_ref().map(|g| g.tracer("my-component"));
//! # Ok::<(), adservice_client::Error>(())
//! ```

use std::path::{Path, PathBuf};

use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{filter::EnvFilter, fmt::format::FmtSpan, layer::SubscriberExt};

use super::formats::build_layer;
use super::resource::DetectResource;
use super::traces::{init_tracerprovider, OtelGuard, TraceExporterKind};
use super::{identity, init_propagator};
use crate::Error;

/// Keeps logging and tracing alive; drop it last.
///
/// - `otel_guard`: flush and shutdown the tracer provider on drop (None when OTEL disabled)
/// - `default_guard`: thread-local subscriber (None when the subscriber is global)
#[must_use = "Recommend holding with 'let _guard = ' pattern to ensure final traces are sent and the subscriber is maintained"]
pub struct Guard {
    pub otel_guard: Option<OtelGuard>,
    pub default_guard: Option<tracing::subscriber::DefaultGuard>,
}

impl Guard {
    #[must_use]
    pub fn has_otel(&self) -> bool {
        self.otel_guard.is_some()
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.default_guard.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// multi-line, colored (development)
    Pretty,
    /// one json object per line (production)
    Json,
    Full,
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTimer {
    None,
    Time,
    Uptime,
}

impl Default for LogTimer {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogTimer::Uptime
        } else {
            LogTimer::Time
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WriterConfig {
    #[default]
    Stdout,
    Stderr,
    /// append to the file, created if missing
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LevelConfig {
    /// takes precedence over env vars
    pub directives: String,
    /// checked in order when `directives` is empty
    pub env_fallbacks: Vec<String>,
    pub default_level: LevelFilter,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            directives: String::new(),
            env_fallbacks: vec!["RUST_LOG".to_string(), "OTEL_LOG_LEVEL".to_string()],
            default_level: LevelFilter::INFO,
        }
    }
}

#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureSet {
    pub file_names: bool,
    pub line_numbers: bool,
    pub thread_names: bool,
    pub span_events: Option<FmtSpan>,
    pub target_display: bool,
    pub timer: LogTimer,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            file_names: true,
            line_numbers: cfg!(debug_assertions),
            thread_names: cfg!(debug_assertions),
            span_events: None,
            target_display: true,
            timer: LogTimer::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OtelConfig {
    pub enabled: bool,
    pub exporter: TraceExporterKind,
    pub resource: DetectResource,
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            exporter: TraceExporterKind::from_env(),
            resource: DetectResource::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: LogFormat,
    pub writer: WriterConfig,
    pub level_config: LevelConfig,
    pub features: FeatureSet,
    pub otel_config: OtelConfig,
    pub global_subscriber: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            writer: WriterConfig::default(),
            level_config: LevelConfig::default(),
            features: FeatureSet::default(),
            otel_config: OtelConfig::default(),
            global_subscriber: true,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_pretty_format(self) -> Self {
        self.with_format(LogFormat::Pretty)
    }

    #[must_use]
    pub fn with_json_format(self) -> Self {
        self.with_format(LogFormat::Json)
    }

    #[must_use]
    pub fn with_compact_format(self) -> Self {
        self.with_format(LogFormat::Compact)
    }

    #[must_use]
    pub fn with_writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }

    #[must_use]
    pub fn with_stdout(self) -> Self {
        self.with_writer(WriterConfig::Stdout)
    }

    #[must_use]
    pub fn with_stderr(self) -> Self {
        self.with_writer(WriterConfig::Stderr)
    }

    #[must_use]
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.with_writer(WriterConfig::File(path.as_ref().to_path_buf()))
    }

    /// Set log directives (takes precedence over environment variables)
    #[must_use]
    pub fn with_log_directives(mut self, directives: impl Into<String>) -> Self {
        self.level_config.directives = directives.into();
        self
    }

    #[must_use]
    pub fn with_default_level(mut self, level: LevelFilter) -> Self {
        self.level_config.default_level = level;
        self
    }

    #[must_use]
    pub fn with_line_numbers(mut self, enabled: bool) -> Self {
        self.features.line_numbers = enabled;
        self
    }

    #[must_use]
    pub fn with_thread_names(mut self, enabled: bool) -> Self {
        self.features.thread_names = enabled;
        self
    }

    #[must_use]
    pub fn with_span_events(mut self, events: FmtSpan) -> Self {
        self.features.span_events = Some(events);
        self
    }

    #[must_use]
    pub fn without_span_events(mut self) -> Self {
        self.features.span_events = None;
        self
    }

    #[must_use]
    pub fn with_timer(mut self, timer: LogTimer) -> Self {
        self.features.timer = timer;
        self
    }

    #[must_use]
    pub fn with_target_display(mut self, enabled: bool) -> Self {
        self.features.target_display = enabled;
        self
    }

    #[must_use]
    pub fn with_otel(mut self, enabled: bool) -> Self {
        self.otel_config.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_trace_exporter(mut self, exporter: TraceExporterKind) -> Self {
        self.otel_config.exporter = exporter;
        self
    }

    #[must_use]
    pub fn with_resource(mut self, resource: DetectResource) -> Self {
        self.otel_config.resource = resource;
        self
    }

    /// When false, the subscriber is only the default of the current thread,
    /// as long as the returned [`Guard`] lives.
    #[must_use]
    pub fn with_global_subscriber(mut self, global: bool) -> Self {
        self.global_subscriber = global;
        self
    }

    pub fn build_filter_layer(&self) -> EnvFilter {
        let dirs = if self.level_config.directives.is_empty() {
            self.level_config
                .env_fallbacks
                .iter()
                .find_map(|var| std::env::var(var).ok())
                .unwrap_or_else(|| self.level_config.default_level.to_string().to_lowercase())
        } else {
            self.level_config.directives.clone()
        };

        EnvFilter::builder()
            .with_default_directive(self.level_config.default_level.into())
            .parse_lossy(dirs)
    }

    /// Install the subscriber and, when enabled, build the tracer provider and the
    /// global propagator.
    pub fn init_subscriber(self) -> Result<Guard, Error> {
        // temporary subscriber, to log during the setup
        let temp_subscriber = tracing_subscriber::registry()
            .with(build_layer(&self)?)
            .with(self.build_filter_layer());
        let otel_guard = tracing::subscriber::with_default(temp_subscriber, || {
            info!("init logging & tracing");
            self.init_otel()
        })?;

        let subscriber = tracing_subscriber::registry()
            .with(build_layer(&self)?)
            .with(self.build_filter_layer());
        if self.global_subscriber {
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(Guard {
                otel_guard,
                default_guard: None,
            })
        } else {
            Ok(Guard {
                otel_guard,
                default_guard: Some(tracing::subscriber::set_default(subscriber)),
            })
        }
    }

    fn init_otel(&self) -> Result<Option<OtelGuard>, Error> {
        if !self.otel_config.enabled {
            info!("OpenTelemetry disabled - proceeding without tracer provider");
            return Ok(None);
        }
        init_propagator()?;
        let resource = self.otel_config.resource.clone().build();
        let tracer_provider = init_tracerprovider(self.otel_config.exporter, resource, identity)?;
        Ok(Some(OtelGuard { tracer_provider }))
    }

    /// - pretty output on stderr, line numbers and thread names
    /// - span events on NEW and CLOSE
    #[must_use]
    pub fn development() -> Self {
        Self::default()
            .with_pretty_format()
            .with_stderr()
            .with_line_numbers(true)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
    }

    /// - json output on stdout, no line numbers, no span events
    #[must_use]
    pub fn production() -> Self {
        Self::default()
            .with_json_format()
            .with_stdout()
            .with_line_numbers(false)
            .with_thread_names(false)
            .without_span_events()
    }

    /// - compact output on stdout, no metadata
    /// - OpenTelemetry disabled
    #[must_use]
    pub fn minimal() -> Self {
        Self::default()
            .with_compact_format()
            .with_stdout()
            .with_line_numbers(false)
            .with_thread_names(false)
            .without_span_events()
            .with_target_display(false)
            .with_otel(false)
    }

    /// - compact output on stderr
    /// - OpenTelemetry disabled, non global subscriber
    #[must_use]
    pub fn testing() -> Self {
        Self::minimal()
            .with_stderr()
            .with_target_display(true)
            .with_global_subscriber(false)
    }
}
