//#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![warn(clippy::perf)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! Client of the hipstershop Ads service: each call is a blocking gRPC request,
//! wrapped in an OpenTelemetry span, with the outcome logged through `tracing`.

mod call_span;
pub mod cli;
pub mod client;
mod error;
pub mod propagation;
pub mod proto;
pub mod status;
pub mod telemetry;

pub use call_span::{RPC_GRPC_STATUS_CODE, RPC_METHOD, RPC_SERVICE, RPC_SYSTEM};
pub use client::{AdClient, AdClientBuilder, Transport, SHUTDOWN_GRACE};
pub use error::Error;
pub use status::CallStatus;

/// Number of `fetch_ads` calls issued by the binary.
pub const FETCH_ROUNDS: usize = 10;
