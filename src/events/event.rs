//! # Runtime events emitted by a ticker.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle events**: started, cancelled, closed
//! - **Control events**: reset applied, paused, tick delivered
//! - **Subscriber events**: overflow and panic reports from subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, ticker
//! name, interval and tick sequence.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tickvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ResetApplied)
//!     .with_ticker("heartbeat")
//!     .with_interval(Duration::from_millis(250));
//!
//! assert_eq!(ev.kind, EventKind::ResetApplied);
//! assert_eq!(ev.ticker.as_deref(), Some("heartbeat"));
//! assert_eq!(ev.interval_ms, Some(250));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Lifecycle events ===
    /// Control loop spawned and timer armed.
    ///
    /// Sets:
    /// - `ticker`: ticker name
    /// - `interval_ms`: initial interval
    TickerStarted,

    /// Lifecycle signal fired without an explicit close
    /// (parent token cancelled, or every handle dropped).
    ///
    /// Sets:
    /// - `ticker`: ticker name
    Cancelled,

    /// Retirement finished: control loop exited, output stream closed.
    ///
    /// Published exactly once per ticker, always last.
    ///
    /// Sets:
    /// - `ticker`: ticker name
    TickerClosed,

    // === Control events ===
    /// Reconfigure accepted; timer rearmed.
    ///
    /// Sets:
    /// - `ticker`: ticker name
    /// - `interval_ms`: new interval
    ResetApplied,

    /// Reconfigure with a zero period accepted; timer disarmed.
    ///
    /// Sets:
    /// - `ticker`: ticker name
    Paused,

    /// A consumer received and confirmed a tick.
    ///
    /// Sets:
    /// - `ticker`: ticker name
    /// - `tick`: per-ticker tick sequence (1-based)
    TickDelivered,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the ticker.
    pub ticker: Option<Arc<str>>,
    /// Name of the subscriber (subscriber events only).
    pub subscriber: Option<Arc<str>>,
    /// Interval in milliseconds (compact).
    pub interval_ms: Option<u32>,
    /// Per-ticker tick sequence number.
    pub tick: Option<u64>,
    /// Human-readable reason (overflow details, panic info).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            ticker: None,
            subscriber: None,
            interval_ms: None,
            tick: None,
            reason: None,
        }
    }

    /// Attaches a ticker name.
    #[inline]
    pub fn with_ticker(mut self, name: impl Into<Arc<str>>) -> Self {
        self.ticker = Some(name.into());
        self
    }

    /// Attaches a subscriber name.
    #[inline]
    pub fn with_subscriber(mut self, name: impl Into<Arc<str>>) -> Self {
        self.subscriber = Some(name.into());
        self
    }

    /// Attaches an interval (stored as milliseconds).
    #[inline]
    pub fn with_interval(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.interval_ms = Some(ms);
        self
    }

    /// Attaches a tick sequence number.
    #[inline]
    pub fn with_tick(mut self, seq: u64) -> Self {
        self.tick = Some(seq);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_subscriber(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_subscriber(subscriber)
            .with_reason(info)
    }

    /// True for the final event of a ticker's lifetime.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::TickerClosed)
    }
}
