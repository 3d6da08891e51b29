use std::future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior, Sleep};

/// Recurring countdown trigger. Stopped whenever the tracker leaves `Pending`.
pub struct CountdownTicker {
    period: Duration,
    interval: Option<Interval>,
}

impl CountdownTicker {
    pub fn new(period: Duration) -> Self {
        Self { period, interval: None }
    }

    /// (Re)starts ticking; the first tick fires one period from now.
    pub fn start(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        // A backgrounded process only needs the latest reading
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
    }

    pub fn cancel(&mut self) {
        self.interval = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Resolves on the next tick; never resolves while cancelled.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => future::pending::<()>().await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    /// Saved reservation found at login.
    Resume,
    Confirmed,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRefresh {
    pub event_id: String,
    pub reason: RefreshReason,
}

/// One-shot delayed reload of an event's details. Scheduling replaces any earlier one.
#[derive(Default)]
pub struct DeferredRefresh {
    pending: Option<(Pin<Box<Sleep>>, ScheduledRefresh)>,
}

impl DeferredRefresh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, event_id: impl Into<String>, reason: RefreshReason, delay: Duration) {
        let refresh = ScheduledRefresh {
            event_id: event_id.into(),
            reason,
        };
        self.pending = Some((Box::pin(tokio::time::sleep(delay)), refresh));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn scheduled(&self) -> Option<&ScheduledRefresh> {
        self.pending.as_ref().map(|(_, refresh)| refresh)
    }

    /// Resolves once the delay elapsed. Cancel-safe: dropping the future keeps the schedule.
    pub async fn fired(&mut self) -> ScheduledRefresh {
        match self.pending.as_mut() {
            Some((sleep, _)) => sleep.as_mut().await,
            None => future::pending::<()>().await,
        }
        match self.pending.take() {
            Some((_, refresh)) => refresh,
            None => future::pending().await,
        }
    }
}
