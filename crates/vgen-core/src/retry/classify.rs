//! Classify transport errors into retry policy failure classes.

use crate::retry::policy::FailureClass;
use crate::transport::TransportError;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u16) -> FailureClass {
    match code {
        500..=599 => FailureClass::ServerError(code),
        _ => FailureClass::ClientError(code),
    }
}

/// Classify a curl error for retry decisions. Only connection-level failures
/// count as `Connection`; everything else is permanent.
pub fn classify_curl_error(e: &curl::Error) -> FailureClass {
    if e.is_operation_timedout() {
        return FailureClass::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return FailureClass::Connection;
    }
    FailureClass::Other
}

/// Classify a transport error into a [`FailureClass`].
pub fn classify(e: &TransportError) -> FailureClass {
    match e {
        TransportError::Network(_) => FailureClass::Connection,
        TransportError::Timeout(_) => FailureClass::Timeout,
        TransportError::Request(_) => FailureClass::Other,
        TransportError::ServerError { status, .. } | TransportError::ClientError { status, .. } => {
            classify_http_status(*status)
        }
    }
}
