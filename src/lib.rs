//! # tickvisor
//!
//! **Tickvisor** is a resettable, pausable async ticker for tokio.
//!
//! Unlike [`tokio::time::Interval`], a [`Ticker`] can change its period after
//! creation, pause without leaking a pending countdown, and be retired so that
//! every consumer waiting on its output observes end-of-stream.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   reset()/stop()          close()          parent token
//!        │                     │                  │
//!        ▼                     ▼                  ▼
//! ┌──────────────┐   ┌──────────────────┐   ┌───────────────────┐
//! │ control chan │   │ once-guard + own │   │ child cancellation│
//! │  (mpsc + ack)│   │  token.cancel()  │   │      token        │
//! └──────┬───────┘   └────────┬─────────┘   └─────────┬─────────┘
//!        └────────────────────┼───────────────────────┘
//!                             ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  ControlLoop (one tokio task per ticker, tracked by TaskTracker)  │
//! │  select! { biased;                                                │
//! │     lifecycle  → exit                                             │
//! │     receipt    → tick confirmed by one consumer, rearm            │
//! │     reconfigure→ rearm / disarm                                   │
//! │     timer      → tick pending, offered to a waiting consumer      │
//! │     demand     → consumer queued }                                │
//! └──────┬──────────────────────────────────────────────────┬─────────┘
//!        ▼                                                  ▼
//!  Ticks::recv() (rendezvous, many consumers)        Bus (broadcast events)
//!                                                           ▼
//!                                                  SubscriberSet → Subscribe
//! ```
//!
//! ### Lifecycle
//! ```text
//! Ticker::new(d) ──► Active(d) ──reset(0)──► Paused ──reset(d')──► Active(d')
//!                        │                     │
//!                        └──── close() / parent cancel / last handle dropped
//!                                      ▼
//!                                 Terminated: output stream closed,
//!                                 reset/stop/close → Err(Closed)
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                |
//! |-------------------|-------------------------------------------------------------|-----------------------------------|
//! | **Ticker**        | Resettable, pausable, retirable periodic emitter.           | [`Ticker`], [`TickerBuilder`]     |
//! | **Output**        | Cloneable rendezvous handle, also usable as a `Stream`.     | [`Ticks`], [`Tick`]               |
//! | **Subscriber API**| Hook into ticker events (logging, metrics, custom).         | [`Subscribe`], [`SubscriberSet`], [`Bus`] |
//! | **Errors**        | Typed error for retired tickers and invalid intervals.      | [`TickerError`]                   |
//! | **Configuration** | Name, initial interval, event bus capacity.                 | [`Config`]                        |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use tickvisor::{Ticker, TickerError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shutdown = CancellationToken::new();
//!     let ticker = Ticker::with_token(Duration::from_millis(10), &shutdown);
//!
//!     let ticks = ticker.ticks();
//!     let worker = tokio::spawn(async move {
//!         let mut seen = 0;
//!         while let Some(_tick) = ticks.recv().await {
//!             seen += 1;
//!         }
//!         seen
//!     });
//!
//!     tokio::time::sleep(Duration::from_millis(35)).await;
//!     ticker.reset(Duration::from_millis(5)).await?;
//!
//!     shutdown.cancel();
//!     ticker.wait().await;
//!     assert!(worker.await? >= 1);
//!     assert_eq!(ticker.close().await, Err(TickerError::Closed));
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Tick, Ticker, TickerBuilder, Ticks};
pub use config::Config;
pub use error::TickerError;
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
