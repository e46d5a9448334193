//! Error types for the classification engine
//!
//! This module provides:
//! - `Error` - the four recoverable failure kinds of the engine
//! - `Result` - the crate-wide result alias
//!
//! Anything not covered by these four kinds (out-of-range indices,
//! mismatched triangulations, malformed weight vectors) is a programming
//! error and panics with a diagnostic rather than returning `Err`.

use std::fmt;

/// Recoverable failures of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// An interval was not accurate enough for the requested algebraic
    /// decision, or a division by an interval containing zero was
    /// attempted. Callers may retry at higher precision.
    Approximation(String),

    /// A precondition on the inputs does not hold: a non-flippable edge,
    /// a lamination that is not a curve, a reducible mapping class where
    /// a pseudo-Anosov one was assumed, an empty feasibility cone.
    Assumption(String),

    /// The finite search space was exhausted without an outcome, e.g. no
    /// invariant lamination was found in any cell.
    Computation(String),

    /// The caller's cancellation predicate fired.
    Abort(String),
}

impl Error {
    /// Create an [`Error::Approximation`] from any message.
    pub fn approximation(msg: impl Into<String>) -> Self {
        Error::Approximation(msg.into())
    }

    /// Create an [`Error::Assumption`] from any message.
    pub fn assumption(msg: impl Into<String>) -> Self {
        Error::Assumption(msg.into())
    }

    /// Create an [`Error::Computation`] from any message.
    pub fn computation(msg: impl Into<String>) -> Self {
        Error::Computation(msg.into())
    }

    /// Create an [`Error::Abort`]. The message names the operation that
    /// was cancelled.
    pub fn abort(msg: impl Into<String>) -> Self {
        Error::Abort(msg.into())
    }

    /// Whether retrying the failed operation at a higher accuracy could
    /// succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Approximation(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Approximation(msg) => write!(f, "approximation error: {}", msg),
            Error::Assumption(msg) => write!(f, "assumption error: {}", msg),
            Error::Computation(msg) => write!(f, "computation error: {}", msg),
            Error::Abort(msg) => write!(f, "aborted: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Cooperative cancellation signal polled by the long-running drivers.
///
/// The predicate is called at every outer loop iteration; returning
/// `true` makes the operation fail with [`Error::Abort`] without any
/// observable state change.
pub type AbortSignal<'a> = &'a dyn Fn() -> bool;

/// Poll an optional cancellation predicate.
pub(crate) fn check_abort(signal: Option<AbortSignal<'_>>, operation: &str) -> Result<()> {
    match signal {
        Some(should_abort) if should_abort() => Err(Error::abort(operation)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_cause() {
        let err = Error::assumption("edge 3 is not flippable");
        assert_eq!(err.to_string(), "assumption error: edge 3 is not flippable");
    }

    #[test]
    fn test_only_approximation_is_retryable() {
        assert!(Error::approximation("too coarse").is_retryable());
        assert!(!Error::computation("no cell").is_retryable());
        assert!(!Error::abort("order").is_retryable());
    }

    #[test]
    fn test_check_abort() {
        assert!(check_abort(None, "op").is_ok());
        let no = || false;
        assert!(check_abort(Some(&no), "op").is_ok());
        let yes = || true;
        assert_eq!(check_abort(Some(&yes), "op"), Err(Error::Abort("op".into())));
    }
}
