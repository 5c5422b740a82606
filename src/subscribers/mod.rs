//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! used to deliver ticker events to user code.
//!
//! ## Architecture
//! ```text
//! ControlLoop ── publish(Event) ──► Bus ──► SubscriberSet::listen
//!                                                 │
//!                                       ┌─────────┼─────────┐
//!                                       ▼         ▼         ▼
//!                                   LogWriter  Metrics   Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use tickvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct TickCounter;
//!
//! #[async_trait]
//! impl Subscribe for TickCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TickDelivered {
//!             // increment tick counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "tick-counter"
//!     }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod embedded;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
