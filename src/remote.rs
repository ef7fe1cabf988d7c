//! Types shared by the recognition and synthesis backends.

use std::fmt;

/// Why the service ended a request early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationDetails {
    /// Broad category, e.g. `Error` or `EndOfStream`.
    pub reason: String,
    /// Machine-readable code, e.g. `ConnectionFailure` or `AuthenticationFailure`.
    pub code: String,
    /// Free-form message from the service.
    pub details: String,
}

impl CancellationDetails {
    pub fn new(
        reason: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            reason: reason.into(),
            code: code.into(),
            details: details.into(),
        }
    }

    /// A cancellation caused by the network rather than the request itself.
    pub fn is_transient(&self) -> bool {
        self.code.contains("ConnectionFailure") || self.details.to_lowercase().contains("timeout")
    }
}

impl fmt::Display for CancellationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reason={} code={}", self.reason, self.code)?;
        if !self.details.is_empty() {
            write!(f, " details={}", self.details)?;
        }
        Ok(())
    }
}
