//! # Ticker: public handle over one control loop.
//!
//! Every entry point other than stream consumption is a message to the
//! [`ControlLoop`](super::control::ControlLoop); the handle never touches the timer.
//!
//! ## Retirement sequence
//! ```text
//! close() ──► claim once-guard ──► token.cancel() ──► tracker.wait() ──► Ok(())
//!                  │                       │
//!                  │ lost                  ▼
//!                  │               loop exit: output closed,
//!                  │               TickerClosed published
//!                  └──► tracker.wait() ──► Err(Closed)
//! ```
//!
//! The terminal event belongs to the loop, so a `close()` future dropped after
//! the claim still ends in a fully retired ticker. Parent cancellation (or
//! dropping every handle) claims the guard from the loop's side; an explicit
//! `close()` afterwards returns `Closed`.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tokio::select;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::builder::TickerBuilder;
use super::control::{Command, claim_retirement};
use super::ticks::{Demand, Tick, Ticks};
use crate::{
    config::Config,
    error::TickerError,
    events::{Bus, Event},
};

/// A periodic tick emitter whose period can be reset, paused and retired.
///
/// Cheap to clone; all clones drive the same control loop. Dropping the last
/// clone retires the ticker.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tickvisor::Ticker;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let ticker = Ticker::new(Duration::from_millis(10));
///     let ticks = ticker.ticks();
///
///     let first = ticks.recv().await.expect("tick");
///     assert_eq!(first.seq, 1);
///
///     ticker.reset(Duration::from_millis(5)).await.expect("open");
///     ticker.close().await.expect("first close");
///     assert_eq!(ticks.recv().await, None);
/// }
/// ```
#[derive(Clone)]
pub struct Ticker {
    inner: Arc<Inner>,
}

struct Inner {
    name: Arc<str>,
    commands: mpsc::Sender<Command>,
    demands: mpsc::UnboundedSender<Demand>,
    token: CancellationToken,
    tracker: TaskTracker,
    retired: Arc<AtomicBool>,
    bus: Bus,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl Ticker {
    /// Creates a ticker firing every `interval`, under a fresh root scope.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Panics
    /// If `interval` is zero.
    pub fn new(interval: Duration) -> Self {
        Self::expect_built(Self::builder(Config::with_interval(interval)).build())
    }

    /// Creates a ticker retired automatically when `parent` is cancelled.
    ///
    /// # Panics
    /// If `interval` is zero.
    pub fn with_token(interval: Duration, parent: &CancellationToken) -> Self {
        Self::expect_built(
            Self::builder(Config::with_interval(interval))
                .with_token(parent)
                .build(),
        )
    }

    /// Fallible form of [`Ticker::new`].
    pub fn try_new(interval: Duration) -> Result<Self, TickerError> {
        Self::builder(Config::with_interval(interval)).build()
    }

    /// Starts a builder for configured tickers (name, parent scope, subscribers).
    pub fn builder(cfg: Config) -> TickerBuilder {
        TickerBuilder::new(cfg)
    }

    fn expect_built(res: Result<Self, TickerError>) -> Self {
        match res {
            Ok(ticker) => ticker,
            Err(e) => panic!("tickvisor: {e}"),
        }
    }

    pub(crate) fn from_parts(
        name: Arc<str>,
        commands: mpsc::Sender<Command>,
        demands: mpsc::UnboundedSender<Demand>,
        token: CancellationToken,
        tracker: TaskTracker,
        retired: Arc<AtomicBool>,
        bus: Bus,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                commands,
                demands,
                token,
                tracker,
                retired,
                bus,
            }),
        }
    }

    /// Changes the period; the next tick comes `period` after the loop accepts it.
    ///
    /// A zero `period` pauses the ticker (see [`Ticker::stop`]). Waits until the
    /// control loop has applied the request.
    ///
    /// # Errors
    /// [`TickerError::Closed`] if the ticker is retired before the request is applied.
    pub async fn reset(&self, period: Duration) -> Result<(), TickerError> {
        let inner = &self.inner;
        let (ack, applied) = oneshot::channel();
        let handoff = async {
            inner
                .commands
                .send(Command { period, ack })
                .await
                .map_err(|_| TickerError::Closed)?;
            applied.await.map_err(|_| TickerError::Closed)
        };

        select! {
            biased;
            _ = inner.token.cancelled() => Err(TickerError::Closed),
            res = handoff => res,
        }
    }

    /// Pauses the ticker; exactly `reset(Duration::ZERO)`.
    ///
    /// The output stream stays open; consumers simply receive nothing until the
    /// next non-zero [`Ticker::reset`].
    ///
    /// # Errors
    /// [`TickerError::Closed`] if the ticker is retired.
    pub async fn stop(&self) -> Result<(), TickerError> {
        self.reset(Duration::ZERO).await
    }

    /// Retires the ticker and closes its output stream.
    ///
    /// Succeeds once per ticker lifetime. Every later (or racing) call waits for
    /// the same control-loop exit and returns [`TickerError::Closed`].
    ///
    /// Dropping the future after it was first polled still retires the ticker.
    ///
    /// # Errors
    /// [`TickerError::Closed`] if retirement already began.
    pub async fn close(&self) -> Result<(), TickerError> {
        let inner = &self.inner;
        if !claim_retirement(&inner.retired) {
            inner.tracker.wait().await;
            return Err(TickerError::Closed);
        }

        inner.token.cancel();
        inner.tracker.wait().await;
        Ok(())
    }

    /// True once the lifecycle signal fired.
    ///
    /// The loop may still be exiting; use [`Ticker::wait`] to observe full exit.
    pub fn is_closed(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Waits until the control loop has fully exited.
    pub async fn wait(&self) {
        self.inner.tracker.wait().await;
    }

    /// Returns a read handle over the output stream.
    pub fn ticks(&self) -> Ticks {
        Ticks::new(self.inner.demands.clone())
    }

    /// Waits for the next tick; shorthand for `self.ticks().recv()`.
    pub async fn recv(&self) -> Option<Tick> {
        self.ticks().recv().await
    }

    /// Subscribes to this ticker's events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Name attached to this ticker's events.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("name", &self.inner.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use futures::StreamExt;
    use std::collections::HashSet;
    use tokio::task::JoinSet;
    use tokio::time::{Instant, sleep, timeout};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test]
    async fn test_first_tick_after_interval() {
        let started = Instant::now();
        let ticker = Ticker::new(ms(50));

        let tick = timeout(ms(150), ticker.recv())
            .await
            .expect("tick within 150ms")
            .expect("open");
        assert_eq!(tick.seq, 1);
        assert!(tick.at.duration_since(started) >= ms(50));

        ticker.close().await.expect("first close");
    }

    #[tokio::test]
    async fn test_reset_measures_from_reset_call() {
        let ticker = Ticker::new(ms(200));
        timeout(ms(500), ticker.recv())
            .await
            .expect("tick before reset")
            .expect("open");

        let reset_at = Instant::now();
        ticker.reset(ms(50)).await.expect("reset");

        let tick = timeout(ms(150), ticker.recv())
            .await
            .expect("quick tick after reset")
            .expect("open");
        assert!(tick.at.duration_since(reset_at) >= ms(50));
        assert_eq!(tick.seq, 2);

        ticker.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_reset_suppresses_armed_tick() {
        let ticker = Ticker::new(ms(50));
        ticker.reset(ms(150)).await.expect("reset");

        assert!(timeout(ms(100), ticker.recv()).await.is_err());
        assert!(timeout(ms(200), ticker.recv()).await.expect("tick").is_some());

        ticker.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_reset_drops_undelivered_tick() {
        let ticker = Ticker::new(ms(5));
        // nobody consumes: the first tick fires and waits for a consumer
        sleep(ms(30)).await;
        ticker.reset(ms(100)).await.expect("reset accepted while tick pending");

        assert!(timeout(ms(50), ticker.recv()).await.is_err());
        ticker.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_stop_prevents_ticks_until_reset() {
        let ticker = Ticker::new(ms(50));
        ticker.stop().await.expect("stop");

        assert!(timeout(ms(100), ticker.recv()).await.is_err());

        let resumed_at = Instant::now();
        ticker.reset(ms(20)).await.expect("resume");
        let tick = timeout(ms(150), ticker.recv())
            .await
            .expect("tick after resume")
            .expect("open");
        assert!(tick.at.duration_since(resumed_at) >= ms(20));
        assert!(!ticker.ticks().is_closed());

        ticker.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_stop_twice_is_fine() {
        let ticker = Ticker::new(ms(50));
        ticker.stop().await.expect("first stop");
        ticker.stop().await.expect("second stop");
        ticker.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_close_ends_consumer_loop() {
        let ticker = Ticker::new(ms(30));
        let ticks = ticker.ticks();

        let consumer = tokio::spawn(async move {
            let mut count = 0u64;
            while let Some(tick) = ticks.recv().await {
                count += 1;
                assert_eq!(tick.seq, count);
            }
            count
        });

        sleep(ms(70)).await;
        ticker.close().await.expect("close");

        let count = timeout(ms(100), consumer)
            .await
            .expect("consumer loop ends after close")
            .expect("consumer task");
        assert!(count >= 1);
        assert!(ticker.ticks().is_closed());
        assert_eq!(ticker.recv().await, None);
    }

    #[tokio::test]
    async fn test_second_close_is_closed() {
        let ticker = Ticker::new(ms(50));
        assert_eq!(ticker.close().await, Ok(()));
        assert_eq!(ticker.close().await, Err(TickerError::Closed));
        assert!(ticker.is_closed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_close_single_success() {
        let ticker = Ticker::new(ms(1));
        let mut set = JoinSet::new();
        for _ in 0..16 {
            let t = ticker.clone();
            set.spawn(async move { t.close().await });
        }

        let mut ok = 0;
        let mut closed = 0;
        while let Some(res) = set.join_next().await {
            match res.expect("close task") {
                Ok(()) => ok += 1,
                Err(TickerError::Closed) => closed += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(closed, 15);
        assert!(ticker.ticks().is_closed());
    }

    #[tokio::test]
    async fn test_reset_and_stop_after_close() {
        let ticker = Ticker::new(ms(50));
        ticker.close().await.expect("close");

        let res = timeout(ms(100), ticker.reset(ms(10))).await.expect("no hang");
        assert_eq!(res, Err(TickerError::Closed));
        let res = timeout(ms(100), ticker.stop()).await.expect("no hang");
        assert_eq!(res, Err(TickerError::Closed));
    }

    #[tokio::test]
    async fn test_parent_cancel_retires() {
        let parent = CancellationToken::new();
        let ticker = Ticker::with_token(ms(1), &parent);

        let tick = timeout(ms(500), ticker.recv())
            .await
            .expect("tick")
            .expect("open");
        assert_eq!(tick.seq, 1);

        parent.cancel();
        timeout(ms(500), ticker.wait()).await.expect("loop exits");

        assert!(ticker.is_closed());
        assert_eq!(ticker.recv().await, None);
        assert_eq!(ticker.close().await, Err(TickerError::Closed));
    }

    #[tokio::test]
    async fn test_close_does_not_cancel_parent() {
        let parent = CancellationToken::new();
        let ticker = Ticker::with_token(ms(10), &parent);
        ticker.close().await.expect("close");
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_retires() {
        let ticker = Ticker::new(ms(10));
        let ticks = ticker.ticks();
        drop(ticker);

        assert_eq!(timeout(ms(500), ticks.recv()).await.expect("no hang"), None);
        assert!(ticks.is_closed());
    }

    #[tokio::test]
    async fn test_dropped_recv_loses_no_tick() {
        let ticker = Ticker::new(ms(10));
        let ticks = ticker.ticks();

        // a consumer that registered interest, then stopped polling and gave up
        let mut abandoned = Box::pin(ticks.recv());
        assert!(futures::poll!(&mut abandoned).is_pending());
        sleep(ms(30)).await;
        drop(abandoned);

        let tick = timeout(ms(100), ticks.recv())
            .await
            .expect("tick handed to next consumer")
            .expect("open");
        assert_eq!(tick.seq, 1);

        ticker.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_recv_in_select_loses_no_tick() {
        let ticker = Ticker::new(ms(5));
        let ticks = ticker.ticks();

        let mut seqs = Vec::new();
        while seqs.len() < 5 {
            select! {
                tick = ticks.recv() => seqs.push(tick.expect("open").seq),
                _ = sleep(ms(1)) => {}
            }
        }
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);

        ticker.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_abandoned_waits_while_paused() {
        let ticker = Ticker::new(ms(10));
        ticker.stop().await.expect("pause");

        for _ in 0..500 {
            assert!(timeout(Duration::ZERO, ticker.recv()).await.is_err());
        }

        ticker.reset(ms(5)).await.expect("resume");
        let tick = timeout(ms(100), ticker.recv())
            .await
            .expect("tick after resume")
            .expect("open");
        assert_eq!(tick.seq, 1);

        ticker.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_huge_interval_is_accepted() {
        let ticker = Ticker::new(Duration::MAX);
        assert!(timeout(ms(30), ticker.recv()).await.is_err());

        ticker.reset(Duration::MAX).await.expect("huge reset");
        assert!(!ticker.is_closed());

        ticker.reset(ms(5)).await.expect("loop still alive");
        let tick = timeout(ms(100), ticker.recv())
            .await
            .expect("tick")
            .expect("open");
        assert_eq!(tick.seq, 1);

        ticker.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_dropped_close_still_publishes_closed() {
        let ticker = Ticker::new(ms(50));
        let mut events = ticker.subscribe();

        // polled once (claims retirement), then dropped mid-wait
        let res = timeout(Duration::ZERO, ticker.close()).await;
        assert!(res.is_err());

        timeout(ms(500), ticker.wait()).await.expect("loop exits");
        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(kinds, vec![EventKind::TickerStarted, EventKind::TickerClosed]);
        assert_eq!(ticker.close().await, Err(TickerError::Closed));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consumers_share_ticks() {
        let ticker = Ticker::new(ms(2));
        let mut set = JoinSet::new();
        for _ in 0..4 {
            let ticks = ticker.ticks();
            set.spawn(async move {
                let mut seqs = Vec::new();
                while let Some(tick) = ticks.recv().await {
                    seqs.push(tick.seq);
                }
                seqs
            });
        }

        sleep(ms(100)).await;
        ticker.close().await.expect("close");

        let mut all = Vec::new();
        while let Some(res) = set.join_next().await {
            let seqs = res.expect("consumer task");
            assert!(seqs.windows(2).all(|w| w[0] < w[1]));
            all.extend(seqs);
        }
        let unique: HashSet<u64> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());

        // every tick went to exactly one consumer, with no gaps
        all.sort_unstable();
        let expected: Vec<u64> = (1..=all.len() as u64).collect();
        assert!(!all.is_empty());
        assert_eq!(all, expected);
    }

    #[tokio::test]
    async fn test_stream_ends_after_close() {
        let ticker = Ticker::new(ms(5));
        let stream = ticker.ticks().into_stream();
        let collector = tokio::spawn(stream.collect::<Vec<Tick>>());

        sleep(ms(40)).await;
        ticker.close().await.expect("close");

        let ticks = timeout(ms(100), collector)
            .await
            .expect("stream ends after close")
            .expect("collector task");
        assert!(!ticks.is_empty());
        assert!(ticks.iter().enumerate().all(|(i, t)| t.seq == i as u64 + 1));
    }

    #[test]
    #[should_panic(expected = "interval must be greater than zero")]
    fn test_zero_interval_panics() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        rt.block_on(async {
            let _ = Ticker::new(Duration::ZERO);
        });
    }

    #[tokio::test]
    async fn test_try_new_rejects_zero() {
        assert_eq!(
            Ticker::try_new(Duration::ZERO).err(),
            Some(TickerError::InvalidInterval)
        );
    }
}
