use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaybywayApiError {
    #[error("Malformed response from the payment gateway: {0}")]
    MalformedResponse(String),
    #[error("Private key or API key not set")]
    CredentialsNotSet,
    #[error("{operation}: Invalid parameters. {reason}")]
    InvalidParameters { operation: &'static str, reason: String },
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request to the payment gateway failed: {0}")]
    TransportError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("MAC verification failed for order {order_number}")]
    MacVerificationFailed { order_number: String },
}

/// The fixed error taxonomy. The discriminants are the stable numeric codes callers dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    MalformedResponse = 1,
    CredentialsNotSet = 2,
    InvalidParameters = 3,
    Protocol = 4,
    MacVerificationFailed = 5,
}

impl ErrorKind {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MalformedResponse => "malformed response",
            Self::CredentialsNotSet => "credentials not set",
            Self::InvalidParameters => "invalid parameters",
            Self::Protocol => "protocol error",
            Self::MacVerificationFailed => "MAC verification failed",
        };
        write!(f, "{s} ({})", self.code())
    }
}

impl PaybywayApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::CredentialsNotSet => ErrorKind::CredentialsNotSet,
            Self::InvalidParameters { .. } => ErrorKind::InvalidParameters,
            Self::Initialization(_) | Self::TransportError(_) | Self::JsonError(_) => ErrorKind::Protocol,
            Self::MacVerificationFailed { .. } => ErrorKind::MacVerificationFailed,
        }
    }

    pub fn code(&self) -> u8 {
        self.kind().code()
    }

    pub(crate) fn invalid(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameters { operation, reason: reason.into() }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(PaybywayApiError::MalformedResponse("x".into()).code(), 1);
        assert_eq!(PaybywayApiError::CredentialsNotSet.code(), 2);
        assert_eq!(PaybywayApiError::invalid("capture", "order number missing").code(), 3);
        assert_eq!(PaybywayApiError::TransportError("refused".into()).code(), 4);
        assert_eq!(PaybywayApiError::JsonError("eof".into()).code(), 4);
        assert_eq!(PaybywayApiError::Initialization("tls".into()).code(), 4);
        assert_eq!(PaybywayApiError::MacVerificationFailed { order_number: "1".into() }.code(), 5);
    }

    #[test]
    fn messages() {
        let e = PaybywayApiError::invalid("createCharge", "amount missing");
        assert_eq!(e.to_string(), "createCharge: Invalid parameters. amount missing");
        assert_eq!(PaybywayApiError::CredentialsNotSet.to_string(), "Private key or API key not set");
        assert_eq!(ErrorKind::Protocol.to_string(), "protocol error (4)");
    }
}
