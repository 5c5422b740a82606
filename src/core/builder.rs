use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::mpsc;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{control::ControlLoop, ticker::Ticker};
use crate::{
    config::Config,
    error::TickerError,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Ticker`] with optional features.
pub struct TickerBuilder {
    cfg: Config,
    parent: Option<CancellationToken>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl TickerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            parent: None,
            subscribers: Vec::new(),
        }
    }

    /// Derives the ticker's lifecycle signal from `parent`.
    ///
    /// Cancelling `parent` retires the ticker; closing the ticker leaves `parent` untouched.
    pub fn with_token(mut self, parent: &CancellationToken) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive ticker events through dedicated workers with bounded
    /// queues; the workers stop after `TickerClosed`.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the ticker and spawns its control loop on the current tokio runtime.
    ///
    /// The timer is armed immediately; the first tick comes one interval later.
    ///
    /// # Errors
    /// [`TickerError::InvalidInterval`] if the configured interval is zero.
    pub fn build(self) -> Result<Ticker, TickerError> {
        let interval = self.cfg.period().ok_or(TickerError::InvalidInterval)?;
        let name: Arc<str> = Arc::from(self.cfg.name.as_ref());
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            tokio::spawn(set.listen(bus.subscribe()));
        }

        let token = match &self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let (cmd_tx, cmd_rx) = mpsc::channel(1);
        let (demand_tx, demand_rx) = mpsc::unbounded_channel();
        let retired = Arc::new(AtomicBool::new(false));

        let control = ControlLoop {
            name: Arc::clone(&name),
            interval,
            commands: cmd_rx,
            demands: demand_rx,
            token: token.clone(),
            retired: Arc::clone(&retired),
            bus: bus.clone(),
        };

        let tracker = TaskTracker::new();
        tracker.spawn(control.run());
        tracker.close();

        Ok(Ticker::from_parts(
            name, cmd_tx, demand_tx, token, tracker, retired, bus,
        ))
    }
}
