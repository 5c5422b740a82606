//! # LogWriter — simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [started] ticker="heartbeat" interval_ms=50
//! [tick] ticker="heartbeat" seq=1
//! [reset] ticker="heartbeat" interval_ms=10
//! [paused] ticker="heartbeat"
//! [cancelled] ticker="heartbeat"
//! [closed] ticker="heartbeat"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let ticker = e.ticker.as_deref().unwrap_or("unknown");
        let subscriber = e.subscriber.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::TickerStarted => {
                println!("[started] ticker={ticker:?} interval_ms={:?}", e.interval_ms);
            }
            EventKind::TickDelivered => {
                println!("[tick] ticker={ticker:?} seq={:?}", e.tick);
            }
            EventKind::ResetApplied => {
                println!("[reset] ticker={ticker:?} interval_ms={:?}", e.interval_ms);
            }
            EventKind::Paused => {
                println!("[paused] ticker={ticker:?}");
            }
            EventKind::Cancelled => {
                println!("[cancelled] ticker={ticker:?}");
            }
            EventKind::TickerClosed => {
                println!("[closed] ticker={ticker:?}");
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={subscriber} reason={:?}",
                    e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={subscriber} info={}",
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
