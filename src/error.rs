//! Error types returned by the ticker.
//!
//! [`TickerError`] is the only error enum in the crate:
//!
//! - [`TickerError::Closed`] — the ticker has been (or is being) retired.
//! - [`TickerError::InvalidInterval`] — a fallible constructor was given a zero interval.
//!
//! Like the rest of the runtime errors it provides `as_label` / `as_message`
//! helpers for logs and metrics.

use thiserror::Error;

/// # Errors produced by a [`Ticker`](crate::Ticker).
///
/// `Closed` is the expected outcome of talking to a retired ticker and should be
/// treated as "already gone", not as a bug.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerError {
    /// The lifecycle signal already fired; the request was discarded.
    #[error("ticker already closed")]
    Closed,

    /// The interval passed to a constructor was zero.
    #[error("ticker interval must be greater than zero")]
    InvalidInterval,
}

impl TickerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickvisor::TickerError;
    ///
    /// assert_eq!(TickerError::Closed.as_label(), "ticker_closed");
    /// assert_eq!(TickerError::InvalidInterval.as_label(), "ticker_invalid_interval");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TickerError::Closed => "ticker_closed",
            TickerError::InvalidInterval => "ticker_invalid_interval",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TickerError::Closed => "closed: ticker retired, request discarded".to_string(),
            TickerError::InvalidInterval => "invalid interval: zero duration".to_string(),
        }
    }

    /// Indicates whether the error only means the ticker is gone.
    ///
    /// # Example
    /// ```
    /// use tickvisor::TickerError;
    ///
    /// assert!(TickerError::Closed.is_closed());
    /// assert!(!TickerError::InvalidInterval.is_closed());
    /// ```
    pub fn is_closed(&self) -> bool {
        matches!(self, TickerError::Closed)
    }
}
