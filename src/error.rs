use crate::ErrorEnvelope;

/// Error type returned by this crate.
///
/// Every variant carries a normalized [`ErrorEnvelope`]; callers are expected
/// to branch on [`ApiError::status_code`] and the envelope's `errors` rather
/// than on transport details.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered `401 Unauthorized`. Stored tokens have been
    /// cleared and the session-expired handler has run.
    #[error("authentication expired: {0}")]
    AuthenticationExpired(ErrorEnvelope),
    /// Timeout or no response, after the retry budget was spent.
    #[error("network failure after {attempts} attempt(s): {envelope}")]
    TransientNetworkFailure {
        envelope: ErrorEnvelope,
        /// Total attempts made, including the first one.
        attempts: usize,
    },
    /// Any other non-success HTTP status.
    #[error("server rejected request: {0}")]
    ServerRejection(ErrorEnvelope),
    /// Transport error that is neither a timeout nor a missing response.
    #[error("transport error: {0}")]
    UnknownTransportFailure(ErrorEnvelope),
    /// The request could not be built (bad header, unencodable body).
    #[error("invalid request: {0}")]
    InvalidRequest(ErrorEnvelope),
    /// A success response whose body does not match the expected payload.
    #[error("decode error: {0}")]
    Decode(ErrorEnvelope),
}

impl ApiError {
    pub fn envelope(&self) -> &ErrorEnvelope {
        match self {
            Self::AuthenticationExpired(envelope)
            | Self::TransientNetworkFailure { envelope, .. }
            | Self::ServerRejection(envelope)
            | Self::UnknownTransportFailure(envelope)
            | Self::InvalidRequest(envelope)
            | Self::Decode(envelope) => envelope,
        }
    }

    pub fn into_envelope(self) -> ErrorEnvelope {
        match self {
            Self::AuthenticationExpired(envelope)
            | Self::TransientNetworkFailure { envelope, .. }
            | Self::ServerRejection(envelope)
            | Self::UnknownTransportFailure(envelope)
            | Self::InvalidRequest(envelope)
            | Self::Decode(envelope) => envelope,
        }
    }

    /// HTTP status of the failure, `0` when no response was received.
    pub fn status_code(&self) -> u16 {
        self.envelope().status_code
    }
}

#[cfg(test)]
mod tests {
    use crate::{ApiError, ErrorEnvelope};

    #[test]
    fn accessors_expose_the_envelope() {
        let err = ApiError::TransientNetworkFailure {
            envelope: ErrorEnvelope::without_response("operation timed out"),
            attempts: 2,
        };
        assert_eq!(err.status_code(), 0);
        assert_eq!(err.envelope().message, "operation timed out");
        assert_eq!(
            err.to_string(),
            "network failure after 2 attempt(s): operation timed out (status 0)"
        );
        assert_eq!(err.into_envelope().message, "operation timed out");
    }
}
