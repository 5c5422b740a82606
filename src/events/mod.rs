//! Ticker events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the control loop
//! and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ControlLoop` (started/reset/paused/tick/cancelled/closed),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the fan-out listener spawned by `TickerBuilder` and any
//!   receiver obtained through `Ticker::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
