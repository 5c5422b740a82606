//! # ControlLoop: the ticker's single decision point.
//!
//! Owns the timer and the write side of the output stream. Every state change
//! happens here, one `select!` pass at a time, so reset, pause, tick delivery and
//! shutdown never race each other.
//!
//! ## States
//! ```text
//!              reset(d > 0)                        timer fired
//!   ┌──────────────────────────┐            ┌──────────────────────┐
//!   ▼                          │            │                      ▼
//! Active(d) ── reset(0) ──► Paused     Active(d) ◄── handed off ── Active(d)+pending
//!   │                          │                                   │
//!   └──────── lifecycle ───────┴──────────► Terminated ◄───────────┘
//! ```
//!
//! ## Priorities (one pass)
//! 0. before selecting: offer the pending tick to the first live waiting consumer
//! 1. lifecycle signal fired → exit
//! 2. offer confirmed → tick counted, rearm for the current interval;
//!    offer abandoned → tick stays pending for the next consumer
//! 3. reconfigure received   → drop pending tick, rearm or disarm, ack caller
//! 4. timer fired (`Active`, nothing pending) → tick becomes pending
//! 5. consumer demand → queued; consumers that gave up are pruned
//!
//! ## Rules
//! - The timer is only polled in `Active`; `Paused` cannot tick by construction.
//! - A reconfigure is accepted even while a fired tick waits for a consumer, and
//!   that tick is dropped unless a consumer already confirmed it. `reset` and
//!   `stop` therefore never block behind an absent consumer, but a tick that
//!   fired just before the reset is lost rather than handed off first.
//! - The interval restarts after a confirmed hand-off, so a slow consumer never
//!   gets a burst.
//! - Deadlines saturate: an interval too large for the clock means "far future".
//! - On exit the demand queue is closed and drained, every waiting consumer sees
//!   end-of-stream, and `TickerClosed` is published exactly once.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, Sleep};
use tokio::{pin, select};
use tokio_util::sync::CancellationToken;

use super::ticks::{Delivery, Demand, Tick};
use crate::events::{Bus, Event, EventKind};

/// Reconfigure request sent by [`Ticker::reset`](crate::Ticker::reset).
pub(crate) struct Command {
    /// New period; zero pauses.
    pub period: Duration,
    /// Completed once the loop applied the request.
    pub ack: oneshot::Sender<()>,
}

/// Ticking state of the loop (`Terminated` is the loop having returned).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum State {
    /// Timer armed; ticks every `interval`.
    Active(Duration),
    /// Timer disarmed until the next non-zero reset.
    Paused,
}

impl State {
    /// Decodes a reconfigure period: zero is the pause encoding.
    pub fn from_period(period: Duration) -> Self {
        if period.is_zero() {
            State::Paused
        } else {
            State::Active(period)
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, State::Active(_))
    }
}

/// Claims the once-guard of the retirement sequence.
///
/// Returns `true` for exactly one caller across the ticker's lifetime.
pub(crate) fn claim_retirement(retired: &AtomicBool) -> bool {
    retired
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

pub(crate) struct ControlLoop {
    pub name: Arc<str>,
    pub interval: Duration,
    pub commands: mpsc::Receiver<Command>,
    pub demands: mpsc::UnboundedReceiver<Demand>,
    pub token: CancellationToken,
    pub retired: Arc<AtomicBool>,
    pub bus: Bus,
}

impl ControlLoop {
    /// Runs until the lifecycle signal fires (or every control handle is gone).
    pub async fn run(mut self) {
        let mut state = State::Active(self.interval);
        let mut out = Handoff::default();

        let timer = time::sleep_until(deadline(self.interval));
        pin!(timer);

        self.publish(Event::new(EventKind::TickerStarted).with_interval(self.interval));

        loop {
            out.offer();

            select! {
                biased;

                _ = self.token.cancelled() => break,

                confirmed = out.receipt(), if out.in_flight.is_some() => {
                    if let Some(tick) = out.settle(confirmed) {
                        self.delivered(tick);
                        if let State::Active(interval) = state {
                            timer.as_mut().reset(deadline(interval));
                        }
                    }
                }

                cmd = self.commands.recv() => {
                    let Some(cmd) = cmd else { break };
                    if let Some(tick) = out.revoke() {
                        self.delivered(tick);
                    }
                    state = State::from_period(cmd.period);
                    self.apply(state, timer.as_mut());
                    let _ = cmd.ack.send(());
                }

                _ = &mut timer, if state.is_active() && out.is_idle() => out.fire(),

                demand = self.demands.recv() => {
                    let Some(reply) = demand else { break };
                    out.enqueue(reply);
                }
            }
        }

        if let Some(tick) = out.revoke() {
            self.delivered(tick);
        }
        self.finish();
    }

    /// Rearms or disarms the timer for a freshly accepted state.
    fn apply(&self, state: State, timer: std::pin::Pin<&mut Sleep>) {
        match state {
            State::Active(interval) => {
                timer.reset(deadline(interval));
                self.publish(Event::new(EventKind::ResetApplied).with_interval(interval));
            }
            State::Paused => {
                self.publish(Event::new(EventKind::Paused));
            }
        }
    }

    /// Closes the output stream and publishes the terminal event.
    ///
    /// When no `close()` call owns the retirement, the loop completes it itself.
    fn finish(mut self) {
        self.demands.close();
        while self.demands.try_recv().is_ok() {}
        self.commands.close();
        while self.commands.try_recv().is_ok() {}

        // Cancellation came from the parent scope or from dropped handles.
        if claim_retirement(&self.retired) {
            self.token.cancel();
            self.publish(Event::new(EventKind::Cancelled));
        }
        self.publish(Event::new(EventKind::TickerClosed));
    }

    fn delivered(&self, tick: Tick) {
        self.publish(Event::new(EventKind::TickDelivered).with_tick(tick.seq));
    }

    fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_ticker(Arc::clone(&self.name)));
    }
}

/// Loop-local delivery bookkeeping: the fired tick, its in-flight offer and the
/// consumers waiting for it.
#[derive(Default)]
struct Handoff {
    pending: Option<Tick>,
    in_flight: Option<oneshot::Receiver<()>>,
    waiting: VecDeque<Demand>,
    delivered: u64,
}

impl Handoff {
    /// True while no fired tick awaits a consumer.
    fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    fn fire(&mut self) {
        self.pending = Some(Tick {
            seq: self.delivered + 1,
            at: Instant::now(),
        });
    }

    /// Queues a consumer, pruning the ones that gave up meanwhile.
    fn enqueue(&mut self, demand: Demand) {
        self.waiting.retain(|d| !d.is_closed());
        self.waiting.push_back(demand);
    }

    /// Offers the pending tick to the first live consumer, unless an offer is in flight.
    fn offer(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        let Some(tick) = self.pending else { return };
        while let Some(reply) = self.waiting.pop_front() {
            let (receipt, confirmed) = oneshot::channel();
            if reply.send(Delivery { tick, receipt }).is_ok() {
                self.in_flight = Some(confirmed);
                return;
            }
        }
    }

    /// Resolves once the in-flight offer is confirmed (`true`) or abandoned (`false`).
    async fn receipt(&mut self) -> bool {
        match self.in_flight.as_mut() {
            Some(confirmed) => confirmed.await.is_ok(),
            None => std::future::pending().await,
        }
    }

    /// Ends the in-flight offer. A confirmed tick is returned and counted; an
    /// abandoned one stays pending for the next consumer.
    fn settle(&mut self, confirmed: bool) -> Option<Tick> {
        self.in_flight = None;
        if !confirmed {
            return None;
        }
        let tick = self.pending.take()?;
        self.delivered = tick.seq;
        Some(tick)
    }

    /// Drops the pending tick. Returns it only if a consumer confirmed it
    /// before the revocation took effect.
    fn revoke(&mut self) -> Option<Tick> {
        let confirmed = self.in_flight.as_mut().is_some_and(|rx| {
            rx.close();
            rx.try_recv().is_ok()
        });
        let tick = self.settle(confirmed);
        self.pending = None;
        tick
    }
}

/// `now + interval`, saturating far in the future instead of overflowing.
fn deadline(interval: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(interval).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Roughly 30 years; what tokio itself uses as "never".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_period_pauses() {
        assert_eq!(State::from_period(Duration::ZERO), State::Paused);
        assert!(!State::Paused.is_active());
    }

    #[test]
    fn test_positive_period_activates() {
        let d = Duration::from_millis(5);
        assert_eq!(State::from_period(d), State::Active(d));
        assert!(State::Active(d).is_active());
    }

    #[test]
    fn test_retirement_claimed_once() {
        let retired = AtomicBool::new(false);
        assert!(claim_retirement(&retired));
        assert!(!claim_retirement(&retired));
        assert!(!claim_retirement(&retired));
    }

    #[test]
    fn test_huge_interval_saturates() {
        let now = Instant::now();
        assert!(deadline(Duration::MAX) > now + Duration::from_secs(86_400));
        assert!(deadline(Duration::from_millis(5)) >= now + Duration::from_millis(5));
    }

    fn confirmed_now(out: &mut Handoff) -> bool {
        out.in_flight
            .as_mut()
            .is_some_and(|rx| rx.try_recv().is_ok())
    }

    #[test]
    fn test_abandoned_demands_are_pruned() {
        let mut out = Handoff::default();
        for _ in 0..1000 {
            let (reply, slot) = oneshot::channel();
            drop(slot);
            out.enqueue(reply);
        }
        assert_eq!(out.waiting.len(), 1);

        let (reply, _slot) = oneshot::channel();
        out.enqueue(reply);
        assert_eq!(out.waiting.len(), 1);
    }

    #[test]
    fn test_abandoned_offer_goes_to_next_consumer() {
        let mut out = Handoff::default();
        out.fire();

        let (gone, gone_slot) = oneshot::channel();
        let (live, mut live_slot) = oneshot::channel();
        out.enqueue(gone);
        out.enqueue(live);

        out.offer();
        assert!(out.in_flight.is_some());
        // the delivery dies with the slot, unconfirmed
        drop(gone_slot);
        let confirmed = confirmed_now(&mut out);
        assert_eq!(out.settle(confirmed), None);
        assert!(!out.is_idle());

        out.offer();
        let delivery = live_slot.try_recv().expect("offered to next consumer");
        assert_eq!(delivery.tick.seq, 1);
        delivery.receipt.send(()).expect("loop waiting for receipt");

        let confirmed = confirmed_now(&mut out);
        assert_eq!(out.settle(confirmed).map(|t| t.seq), Some(1));
        assert!(out.is_idle());

        out.fire();
        assert_eq!(out.pending.map(|t| t.seq), Some(2));
    }

    #[test]
    fn test_revoke_keeps_confirmed_tick_only() {
        let mut out = Handoff::default();
        out.fire();
        let (reply, mut slot) = oneshot::channel();
        out.enqueue(reply);
        out.offer();

        let delivery = slot.try_recv().expect("offered");
        assert_eq!(out.revoke(), None);
        assert!(out.is_idle());
        assert!(delivery.receipt.send(()).is_err());

        out.fire();
        assert_eq!(out.pending.map(|t| t.seq), Some(1));
        let (reply, mut slot) = oneshot::channel();
        out.enqueue(reply);
        out.offer();
        let delivery = slot.try_recv().expect("offered");
        delivery.receipt.send(()).expect("loop waiting for receipt");
        assert_eq!(out.revoke().map(|t| t.seq), Some(1));
        assert_eq!(out.delivered, 1);
    }
}
