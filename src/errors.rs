use serde_json::Value;
use std::fmt;

/// Coarse classification of a failed call.
///
/// Every [`AppError`] maps onto exactly one of these kinds, so callers can
/// branch on the failure without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The response parsed but lacked the expected token or identifier.
    MissingField,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The server answered with a non-success status code.
    HttpStatus,
    /// Any other transport, parsing, template or file fault.
    Other,
}

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// A successful response did not contain the expected field.
    MissingField {
        /// Dotted path of the field that was looked up.
        field: &'static str,
        /// The raw response body.
        response: Value,
    },
    /// The request timed out.
    Timeout(String),
    /// The server returned an error status.
    HttpStatus {
        status: u16,
        reason: String,
        /// First error detail reported by the API, if any.
        detail: Option<String>,
    },
    /// Connection or other transport-level failure.
    Transport(String),
    /// The response body was not the JSON we expected.
    Decode(String),
    /// A request template could not be loaded.
    Template(String),
    /// Writing a report to disk failed.
    Io(std::io::Error),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Projects the error onto the four-kind taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::MissingField { .. } => ErrorKind::MissingField,
            AppError::Timeout(_) => ErrorKind::Timeout,
            AppError::HttpStatus { .. } => ErrorKind::HttpStatus,
            AppError::Transport(_)
            | AppError::Decode(_)
            | AppError::Template(_)
            | AppError::Io(_) => ErrorKind::Other,
            AppError::WithContext { source, .. } => source.kind(),
        }
    }

    /// Returns the innermost error, skipping any context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingField { field, .. } => {
                write!(f, "Response missing field '{}'", field)
            }
            AppError::Timeout(msg) => write!(f, "Server timeout: {}", msg),
            AppError::HttpStatus {
                status,
                reason,
                detail,
            } => match detail {
                Some(detail) => write!(f, "{}: {} ({})", status, reason, detail),
                None => write!(f, "{}: {}", status, reason),
            },
            AppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AppError::Decode(msg) => write!(f, "Decode error: {}", msg),
            AppError::Template(msg) => write!(f, "Template error: {}", msg),
            AppError::Io(e) => write!(f, "IO error: {}", e),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(e) => Some(e),
            AppError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    ///
    /// Timeouts keep their own variant; decode failures are separated from
    /// connection failures.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
