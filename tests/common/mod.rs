#![allow(dead_code)]

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use adservice_client::proto::hipstershop::ad_service_server::{AdService, AdServiceServer};
use adservice_client::proto::{Ad, AdRequest, AdResponse};
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// What the fake service answers to every `GetAds`.
#[derive(Clone, Debug)]
pub enum Behavior {
    Ads(Vec<Ad>),
    Fail(tonic::Code, String),
}

#[derive(Clone, Debug, Default)]
pub struct Received {
    pub context_keys: Vec<String>,
    pub traceparent: Option<String>,
}

struct FakeAdService {
    behavior: Behavior,
    received: Arc<Mutex<Vec<Received>>>,
}

#[tonic::async_trait]
impl AdService for FakeAdService {
    async fn get_ads(&self, request: Request<AdRequest>) -> Result<Response<AdResponse>, Status> {
        let traceparent = request
            .metadata()
            .get("traceparent")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        self.received.lock().unwrap().push(Received {
            context_keys: request.into_inner().context_keys,
            traceparent,
        });
        match &self.behavior {
            Behavior::Ads(ads) => Ok(Response::new(AdResponse { ads: ads.clone() })),
            Behavior::Fail(code, message) => Err(Status::new(*code, message.clone())),
        }
    }
}

/// Plaintext `hipstershop.AdService` on an ephemeral port, served from its own thread.
pub struct FakeAdServer {
    pub port: u16,
    received: Arc<Mutex<Vec<Received>>>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl FakeAdServer {
    pub fn start(behavior: Behavior) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let service = FakeAdService {
            behavior,
            received: received.clone(),
        };
        let (port_tx, port_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                port_tx.send(listener.local_addr().unwrap().port()).unwrap();
                tonic::transport::Server::builder()
                    .add_service(AdServiceServer::new(service))
                    .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .unwrap();
            });
        });
        let port = port_rx.recv().unwrap();
        Self {
            port,
            received,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for FakeAdServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub fn ad(text: &str) -> Ad {
    Ad {
        redirect_url: format!("/product/{}", text.to_lowercase().replace(' ', "-")),
        text: text.to_owned(),
    }
}

/// A port where nothing listens (bound then released).
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Accepts tcp connections (through the backlog) but never answers.
pub fn silent_listener() -> std::net::TcpListener {
    std::net::TcpListener::bind("127.0.0.1:0").unwrap()
}

pub fn in_memory_provider() -> (SdkTracerProvider, InMemorySpanExporter) {
    let exporter = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (provider, exporter)
}

/// Run `f` with a thread-local json subscriber, return the logged events.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<Value>) {
    let (make_writer, rx) = duplex_writer();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(make_writer);
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::try_new("adservice_client=trace").unwrap())
        .with(fmt_layer);
    let result = tracing::subscriber::with_default(subscriber, f);
    let events = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|bytes| serde_json::from_slice::<Value>(&bytes).unwrap())
        .collect();
    (result, events)
}

pub fn message(event: &Value) -> &str {
    event["fields"]["message"].as_str().unwrap_or_default()
}

pub fn level(event: &Value) -> &str {
    event["level"].as_str().unwrap_or_default()
}

fn duplex_writer() -> (DuplexWriter, Receiver<Vec<u8>>) {
    let (tx, rx) = mpsc::sync_channel(1024);
    (DuplexWriter { tx }, rx)
}

#[derive(Clone)]
struct DuplexWriter {
    tx: SyncSender<Vec<u8>>,
}

impl<'a> MakeWriter<'a> for DuplexWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl std::io::Write for DuplexWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.tx.send(buf.to_vec()).unwrap();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
