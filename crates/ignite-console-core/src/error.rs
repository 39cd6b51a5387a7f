// ── Core error types ──
//
// User-facing errors from ignite-console-core. Consumers never see raw
// HTTP status codes or JSON parse failures; the `From<ignite_console_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Backend request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {identifier}")]
    NotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{title}: {message}")]
    SaveFailed { title: String, message: String },

    #[error("{message}")]
    LoadFailed { message: String },

    /// The effects task is gone; nothing will answer the request.
    #[error("Console stopped")]
    ConsoleStopped,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The human-readable part of the error, without the variant prefix.
    ///
    /// This is what `_ERR` actions carry as their message.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. }
            | Self::AuthenticationFailed { message }
            | Self::LoadFailed { message }
            | Self::SaveFailed { message, .. }
            | Self::Config { message }
            | Self::Internal(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ignite_console_api::Error> for CoreError {
    fn from(err: ignite_console_api::Error) -> Self {
        use ignite_console_api::Error as ApiError;

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api { status: 404, message } => CoreError::NotFound {
                identifier: message,
            },
            ApiError::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_keeps_raw_message() {
        let err = CoreError::from(ignite_console_api::Error::Api {
            status: 500,
            message: "Cluster name is not unique".into(),
        });
        assert_eq!(err.message(), "Cluster name is not unique");
        assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
    }

    #[test]
    fn not_found_maps_from_404() {
        let err = CoreError::from(ignite_console_api::Error::Api {
            status: 404,
            message: "missing".into(),
        });
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
