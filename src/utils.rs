//! Small helpers shared by the client and configuration.

/// Returns the first present candidate, scanning left to right.
///
/// Only `None` is skipped: `Some("")` is a present value and wins over any
/// later candidate.
pub fn coalesce<T, I>(candidates: I) -> Option<T>
where
    I: IntoIterator<Item = Option<T>>,
{
    candidates.into_iter().flatten().next()
}

/// Masks a secret for logging, keeping only its length.
pub fn redact(secret: &str) -> String {
    format!("[REDACTED; {} chars]", secret.len())
}
