//! # Output stream of a ticker.
//!
//! [`Ticks`] is the read side of the ticker's output. It is a rendezvous, not a
//! buffer: every call to [`Ticks::recv`] posts a one-shot reply slot on the
//! control loop's demand queue, and the loop fills exactly one slot per fired
//! tick.
//!
//! ```text
//! consumer A ── recv() ──► [demand queue] ──► ControlLoop
//! consumer B ── recv() ──►        │              │ timer fired
//!                                 └─ Delivery ◄──┘ (one slot per tick)
//!                 confirm() ──── receipt ───────►│ tick counted, timer rearmed
//! ```
//!
//! ## Rules
//! - At most one tick is in flight; nothing is buffered ahead of a consumer.
//! - A tick counts as delivered only once a consumer confirmed it. A `recv`
//!   future dropped at any await point never swallows a tick: the unconfirmed
//!   [`Delivery`] is dropped with the slot and the loop hands the same tick to
//!   the next waiting consumer.
//! - If the loop revokes a delivery (reconfigure, retirement) before it is
//!   confirmed, the consumer keeps waiting or observes end-of-stream.
//! - Once the control loop exits, every pending and future `recv` yields `None`.

use futures::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

/// Reply slot posted by a waiting consumer.
pub(crate) type Demand = oneshot::Sender<Delivery>;

/// A single timestamped tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Per-ticker delivery sequence, starting at 1.
    pub seq: u64,
    /// Moment the underlying timer fired.
    pub at: Instant,
}

/// A tick offered to one consumer, plus the receipt that makes it count.
///
/// Dropping it unconfirmed returns the tick to the loop.
#[derive(Debug)]
pub(crate) struct Delivery {
    pub tick: Tick,
    pub receipt: oneshot::Sender<()>,
}

impl Delivery {
    /// Confirms the hand-off; `None` if the loop revoked it meanwhile.
    fn confirm(self) -> Option<Tick> {
        self.receipt.send(()).ok()?;
        Some(self.tick)
    }
}

/// Cloneable read handle over a ticker's output stream.
///
/// Any number of handles may consume concurrently; each tick goes to exactly one of them.
#[derive(Clone, Debug)]
pub struct Ticks {
    demands: mpsc::UnboundedSender<Demand>,
}

impl Ticks {
    pub(crate) fn new(demands: mpsc::UnboundedSender<Demand>) -> Self {
        Self { demands }
    }

    /// Waits for the next tick.
    ///
    /// Returns `None` once the ticker has been retired and its control loop exited.
    ///
    /// # Cancel safety
    /// Cancel safe. If the future is dropped (for example as the losing branch
    /// of a `select!`) no tick is lost; another consumer receives it.
    pub async fn recv(&self) -> Option<Tick> {
        loop {
            let (reply, slot) = oneshot::channel();
            self.demands.send(reply).ok()?;
            let delivery = slot.await.ok()?;
            if let Some(tick) = delivery.confirm() {
                return Some(tick);
            }
        }
    }

    /// True once the output stream is closed (no further ticks, ever).
    pub fn is_closed(&self) -> bool {
        self.demands.is_closed()
    }

    /// Turns the handle into a [`Stream`] that ends when the ticker is closed.
    pub fn into_stream(self) -> impl Stream<Item = Tick> + Send + 'static {
        futures::stream::unfold(self, |ticks| async move {
            let tick = ticks.recv().await?;
            Some((tick, ticks))
        })
    }
}
