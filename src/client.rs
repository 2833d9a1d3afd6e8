//! Blocking, traced client of the Ads service.
//!
//! ```no_run
//! use adservice_client::{AdClient, Transport};
//! use opentelemetry::trace::TracerProvider as _;
//!
//! let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder().build();
//! let client = AdClient::builder("localhost", 9555)
//!     .with_transport(Transport::Plaintext)
//!     .connect(provider.tracer("AdServiceClient"))?;
//! client.fetch_ads("camera");
//! client.shutdown();
//! # Ok::<(), adservice_client::Error>(())
//! ```
use std::time::Duration;

use opentelemetry::trace::Tracer;
use tokio::runtime::Runtime;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, info, warn};

use crate::call_span::CallSpan;
use crate::propagation::{find_trace_id, inject_context};
use crate::proto::{AdRequest, AdServiceClient, AD_SERVICE, GET_ADS};
use crate::status::CallStatus;
use crate::Error;

/// How long `shutdown` waits for in-flight work before abandoning it.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Env var read by [`Transport::from_env`].
pub const TRANSPORT_ENV: &str = "AD_SERVICE_TRANSPORT";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Transport {
    /// https, server certificate checked against the webpki roots
    #[default]
    Tls,
    /// http/2 over plain tcp, for local demos without certificates
    Plaintext,
}

impl Transport {
    /// Read `AD_SERVICE_TRANSPORT` (`tls` or `plaintext`), unknown values keep the default.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(TRANSPORT_ENV) {
            Ok(value) => Self::parse_or_default(&value),
            Err(_) => Self::default(),
        }
    }

    fn parse_or_default(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tls" | "https" => Transport::Tls,
            "plaintext" | "http" => Transport::Plaintext,
            other => {
                warn!("{TRANSPORT_ENV} '{other}' is invalid, use default transport tls.");
                Self::default()
            }
        }
    }

    fn scheme(self) -> &'static str {
        match self {
            Transport::Tls => "https",
            Transport::Plaintext => "http",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdClientBuilder {
    host: String,
    port: u16,
    transport: Transport,
    request_timeout: Option<Duration>,
}

impl AdClientBuilder {
    #[must_use]
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Bound the duration of each call. Default is `None`: a call waits as long as
    /// the transport allows.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn uri(&self) -> String {
        format!("{}://{}:{}", self.transport.scheme(), self.host, self.port)
    }

    /// Create the client. The channel is lazy: an unreachable server is only
    /// noticed by the first call.
    pub fn connect<T>(self, tracer: T) -> Result<AdClient<T>, Error>
    where
        T: Tracer,
        T::Span: Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let uri = self.uri();
        let mut endpoint = Endpoint::from_shared(uri.clone())?;
        if self.transport == Transport::Tls {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_enabled_roots())?;
        }
        if let Some(timeout) = self.request_timeout {
            endpoint = endpoint.timeout(timeout);
        }
        // the channel spawns its worker on the runtime
        let channel = {
            let _entered = runtime.enter();
            endpoint.connect_lazy()
        };
        debug!(%uri, transport = ?self.transport, timeout = ?self.request_timeout, "ads service channel created");
        Ok(AdClient {
            stub: AdServiceClient::new(channel),
            tracer,
            runtime,
        })
    }
}

/// Client of `hipstershop.AdService`.
///
/// Calls block the caller; the client is meant to be driven from a single thread.
///
/// # Panics
///
/// The client owns its own runtime: [`AdClient::fetch_ads`], [`AdClient::shutdown`] and
/// dropping the client panic when called from within an async context (eg inside
/// `#[tokio::main]`). Drive it from a plain thread, or from `spawn_blocking`.
pub struct AdClient<T> {
    stub: AdServiceClient<Channel>,
    tracer: T,
    runtime: Runtime,
}

impl AdClient<()> {
    #[must_use]
    pub fn builder(host: impl Into<String>, port: u16) -> AdClientBuilder {
        AdClientBuilder {
            host: host.into(),
            port,
            transport: Transport::default(),
            request_timeout: None,
        }
    }
}

impl<T> AdClient<T>
where
    T: Tracer,
    T::Span: Send + Sync + 'static,
{
    /// Request the ads for `context_key` and log their text.
    ///
    /// Failures are logged and recorded on the span, never returned.
    pub fn fetch_ads(&self, context_key: &str) {
        info!("Get Ads with context {context_key} ...");
        let request = AdRequest {
            context_keys: vec![context_key.to_owned()],
        };

        let call = CallSpan::start(&self.tracer, AD_SERVICE, GET_ADS);
        let trace_id = find_trace_id(call.context()).unwrap_or_default();
        call.add_event("Getting Ads");

        let mut request = tonic::Request::new(request);
        inject_context(call.context(), request.metadata_mut());
        let mut stub = self.stub.clone();
        match self.runtime.block_on(stub.get_ads(request)) {
            Ok(response) => {
                call.add_event("Received response from Ads Service.");
                call.record_grpc_code(tonic::Code::Ok);
                call.set_status(CallStatus::Ok);
                for ad in response.into_inner().ads {
                    info!(%trace_id, "Ads: {}", ad.text);
                }
            }
            Err(status) => {
                call.record_grpc_code(status.code());
                call.set_status(CallStatus::from_grpc(&status));
                warn!(%trace_id, code = ?status.code(), "RPC failed: {status}");
            }
        }
    }

    /// Close the channel and wait up to [`SHUTDOWN_GRACE`] for in-flight work.
    pub fn shutdown(self) {
        self.shutdown_within(SHUTDOWN_GRACE);
    }

    fn shutdown_within(self, grace: Duration) {
        info!("Shutting down channel, waiting up to {grace:?}");
        drop(self.stub);
        self.runtime.shutdown_timeout(grace);
    }
}
