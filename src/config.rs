//! # Ticker configuration.
//!
//! Provides [`Config`], the settings consumed by [`TickerBuilder`](crate::TickerBuilder).
//!
//! ## Sentinel values
//! - `interval = 0s` → invalid; [`Config::period`] returns `None` and the builder
//!   fails with [`TickerError::InvalidInterval`](crate::TickerError::InvalidInterval)
//! - `bus_capacity = 0` → clamped to 1

use std::borrow::Cow;
use std::time::Duration;

/// Settings for a single ticker instance.
///
/// ## Field semantics
/// - `name`: label attached to every published [`Event`](crate::Event)
/// - `interval`: initial period between ticks (must be non-zero)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
///
/// ## Notes
/// All fields are public. Prefer the helper accessors to avoid sprinkling
/// sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Human-readable ticker name used in events and logs.
    pub name: Cow<'static, str>,

    /// Initial period between ticks.
    ///
    /// `Duration::ZERO` is rejected at construction time; pausing is only
    /// possible after construction via [`Ticker::stop`](crate::Ticker::stop).
    pub interval: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers lagging more than `bus_capacity` events observe `Lagged`
    /// and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Creates a config with the given interval and default everything else.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Sets the ticker name.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the initial period as an `Option`.
    ///
    /// - `None` → zero interval (invalid)
    /// - `Some(d)` → tick every `d`
    #[inline]
    pub fn period(&self) -> Option<Duration> {
        if self.interval.is_zero() {
            None
        } else {
            Some(self.interval)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `name = "ticker"`
    /// - `interval = 1s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("ticker"),
            interval: Duration::from_secs(1),
            bus_capacity: 1024,
        }
    }
}
