use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// What went wrong below the JSON layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Network,
    Timeout,
    MalformedJson,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Timeout => write!(f, "timeout"),
            Self::MalformedJson => write!(f, "malformed-json"),
        }
    }
}

/// Ways a well-formed JSON response can still break the envelope convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    UnexpectedEnvelopeShape,
    MissingJobId,
    UnknownJobStatus,
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnvelopeShape => write!(f, "unexpected-envelope-shape"),
            Self::MissingJobId => write!(f, "missing-job-id"),
            Self::UnknownJobStatus => write!(f, "unknown-job-status"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Transport error ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("Protocol error ({kind}): {message}")]
    Protocol {
        kind: ProtocolErrorKind,
        message: String,
    },

    #[error("API error: {code} - {text}")]
    Api { code: i64, text: String },

    #[error("Async job {job_id} failed: {code} - {text}")]
    AsyncJobFailed {
        job_id: String,
        code: i64,
        text: String,
    },

    #[error("Async job {job_id} did not complete within {}s", waited.as_secs())]
    AsyncJobExpired { job_id: String, waited: Duration },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::core::config::ConfigError),
}

impl CloudError {
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    pub fn protocol(kind: ProtocolErrorKind, message: impl Into<String>) -> Self {
        Self::Protocol {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for CloudError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_decode() {
            TransportErrorKind::MalformedJson
        } else {
            TransportErrorKind::Network
        };
        Self::transport(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_keeps_provider_text() {
        let err = CloudError::Api {
            code: 431,
            text: "bad request".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 431 - bad request");
    }

    #[test]
    fn test_expired_display() {
        let err = CloudError::AsyncJobExpired {
            job_id: "abc".to_string(),
            waited: Duration::from_secs(300),
        };
        assert_eq!(
            err.to_string(),
            "Async job abc did not complete within 300s"
        );
    }

    #[test]
    fn test_kind_display() {
        let err = CloudError::transport(TransportErrorKind::MalformedJson, "eof");
        assert_eq!(err.to_string(), "Transport error (malformed-json): eof");
    }
}
