//! Ticker core: handle, control loop and output stream.
//!
//! The public API from this module is [`Ticker`], [`TickerBuilder`], [`Ticks`]
//! and [`Tick`].
//!
//! Internal modules:
//! - [`control`]: the control loop state machine (timer, reconfigure, hand-off, exit);
//! - [`ticker`]: public handle, once-guarded retirement, queries;
//! - [`ticks`]: rendezvous output stream;
//! - [`builder`]: wiring of channels, cancellation scope, subscribers and the loop task.

mod builder;
mod control;
mod ticker;
mod ticks;

pub use builder::TickerBuilder;
pub use ticker::Ticker;
pub use ticks::{Tick, Ticks};
