//! Messages and stubs generated from `proto/demo.proto`.

#![allow(clippy::pedantic)]

pub mod hipstershop {
    tonic::include_proto!("hipstershop");
}

pub use hipstershop::ad_service_client::AdServiceClient;
pub use hipstershop::{Ad, AdRequest, AdResponse};

/// gRPC service name, as used in the request path and the `rpc.service` attribute.
pub const AD_SERVICE: &str = "hipstershop.AdService";
/// gRPC method name, as used in the request path and the `rpc.method` attribute.
pub const GET_ADS: &str = "GetAds";
