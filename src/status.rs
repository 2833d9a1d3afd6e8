use opentelemetry::trace::Status;
use tonic::Code;

/// Coarse outcome of a call, as reported on its span.
///
/// No fine-grained mapping of gRPC codes is attempted: anything but `OK` becomes
/// `Unknown`, carrying the message of the original status. The numeric code is
/// still recorded on the span (`rpc.grpc.status_code`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallStatus {
    Ok,
    Unknown { description: String },
}

impl CallStatus {
    #[must_use]
    pub fn from_grpc(status: &tonic::Status) -> Self {
        if status_is_error(status.code()) {
            CallStatus::Unknown {
                description: status.message().to_owned(),
            }
        } else {
            CallStatus::Ok
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, CallStatus::Ok)
    }
}

impl From<CallStatus> for Status {
    fn from(value: CallStatus) -> Self {
        match value {
            CallStatus::Ok => Status::Ok,
            CallStatus::Unknown { description } => Status::error(description),
        }
    }
}

/// see [Semantic Conventions for gRPC | OpenTelemetry](https://opentelemetry.io/docs/specs/semconv/rpc/grpc/)
///
/// On the client side every code other than `OK` is an error.
#[inline]
#[must_use]
pub fn status_is_error(code: Code) -> bool {
    code != Code::Ok
}
