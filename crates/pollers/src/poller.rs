// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Reference-counted polling
//!
//! A [`Poller`] runs one timer while at least one [`PollSubscription`] is alive.
//! The first subscriber triggers an immediate fetch; the last one to leave stops
//! the timer. Results are published through a `watch` channel.

use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use api_client::ApiError;
use chrono::{DateTime, Utc};
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A periodically fetched value
pub trait PollSource: Send + Sync + 'static {
    /// Published value
    type Output: Clone + Send + Sync + 'static;

    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Default tick interval
    fn interval(&self) -> Duration;

    /// Fetch a fresh value
    fn fetch(&self) -> impl Future<Output = Result<Self::Output, ApiError>> + Send;

    /// Combine a fresh value with the previously published one
    fn merge(&self, previous: Option<&Self::Output>, fresh: Self::Output) -> Self::Output {
        let _ = previous;
        fresh
    }
}

/// Observable poller state
#[derive(Debug, Clone)]
pub struct PollState<T> {
    /// Last successfully fetched value
    pub value: Option<T>,
    /// Error of the last fetch, cleared by the next success
    pub error: Option<ApiError>,
    /// Subscribed but no successful fetch yet
    pub loading: bool,
    /// Time of the last successful fetch
    pub last_update: Option<DateTime<Utc>>,
    /// Number of successful fetches
    pub refresh_count: u64,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
            loading: false,
            last_update: None,
            refresh_count: 0,
        }
    }
}

#[derive(Default)]
struct Lifecycle {
    subscribers: usize,
    timer: Option<CancellationToken>,
}

struct Inner<S: PollSource> {
    source: S,
    interval: Duration,
    state: watch::Sender<PollState<S::Output>>,
    lifecycle: Mutex<Lifecycle>,
}

impl<S: PollSource> Inner<S> {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn refresh(&self) -> Result<S::Output, ApiError> {
        let name = self.source.name();
        match self.source.fetch().await {
            Ok(fresh) => {
                let mut published = None;
                self.state.send_modify(|state| {
                    let value = self.source.merge(state.value.as_ref(), fresh);
                    published = Some(value.clone());
                    state.value = Some(value);
                    state.error = None;
                    state.loading = false;
                    state.last_update = Some(Utc::now());
                    state.refresh_count += 1;
                });
                debug!(poller = name, "poll succeeded");
                published.ok_or_else(|| ApiError::InvalidResponse {
                    message: format!("{name} poller published no value"),
                })
            }
            Err(err) => {
                error!(poller = name, error = %err, "poll failed");
                self.state.send_modify(|state| state.error = Some(err.clone()));
                Err(err)
            }
        }
    }

    fn release(&self) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.subscribers == 0 {
            return;
        }
        lifecycle.subscribers -= 1;
        if lifecycle.subscribers > 0 {
            return;
        }
        self.state.send_modify(|state| state.loading = false);
        if let Some(timer) = lifecycle.timer.take() {
            timer.cancel();
            info!(poller = self.source.name(), "last subscriber left, polling stopped");
        }
    }
}

/// Shared poller handle
pub struct Poller<S: PollSource> {
    inner: Arc<Inner<S>>,
}

impl<S: PollSource> Clone for Poller<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PollSource> fmt::Debug for Poller<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("source", &self.inner.source.name())
            .field("interval", &self.inner.interval)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<S: PollSource> Poller<S> {
    /// Poller ticking at the source's default interval
    pub fn new(source: S) -> Self {
        let interval = source.interval();
        Self::with_interval(source, interval)
    }

    /// Poller ticking at a custom interval
    pub fn with_interval(source: S, interval: Duration) -> Self {
        let (state, _) = watch::channel(PollState::default());
        Self {
            inner: Arc::new(Inner {
                source,
                interval,
                state,
                lifecycle: Mutex::new(Lifecycle::default()),
            }),
        }
    }

    /// The polled source
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Tick interval
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Register a subscriber, starting the timer if it is the first
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> PollSubscription<S> {
        let mut lifecycle = self.inner.lifecycle();
        lifecycle.subscribers += 1;
        if lifecycle.subscribers == 1 {
            self.inner.state.send_modify(|state| {
                if state.value.is_none() {
                    state.loading = true;
                }
            });
            lifecycle.timer = Some(self.start_timer());
            info!(
                poller = self.inner.source.name(),
                interval_ms = self.inner.interval.as_millis(),
                "first subscriber, polling started"
            );
        }
        PollSubscription {
            inner: Arc::clone(&self.inner),
            active: true,
        }
    }

    fn start_timer(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let inner = Arc::clone(&self.inner);
        let cancelled = token.clone();
        tokio::spawn(async move {
            let mut ticker = interval(inner.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let ticking = async {
                loop {
                    ticker.tick().await;
                    // Failures are published through the state channel.
                    let _ = inner.refresh().await;
                }
            };
            let _: Option<()> = cancelled.run_until_cancelled(ticking).await;
            debug!(poller = inner.source.name(), "timer task exited");
        });
        token
    }

    /// Fetch now, regardless of subscribers and timer
    ///
    /// # Errors
    ///
    /// Returns the fetch error, which is also published in the state.
    pub async fn force_refresh(&self) -> Result<S::Output, ApiError> {
        self.inner.refresh().await
    }

    /// Whether the timer is running
    pub fn is_active(&self) -> bool {
        self.inner.lifecycle().timer.is_some()
    }

    /// Live subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.inner.lifecycle().subscribers
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PollState<S::Output> {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<PollState<S::Output>> {
        self.inner.state.subscribe()
    }
}

/// Keeps a [`Poller`] active until unsubscribed or dropped
#[must_use = "dropping the subscription stops polling when it is the last one"]
pub struct PollSubscription<S: PollSource> {
    inner: Arc<Inner<S>>,
    active: bool,
}

impl<S: PollSource> PollSubscription<S> {
    /// Release this subscription; repeated calls do nothing
    pub fn unsubscribe(&mut self) {
        if std::mem::take(&mut self.active) {
            self.inner.release();
        }
    }

    /// Whether this handle still counts as a subscriber
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl<S: PollSource> fmt::Debug for PollSubscription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollSubscription")
            .field("source", &self.inner.source.name())
            .field("active", &self.active)
            .finish()
    }
}

impl<S: PollSource> Drop for PollSubscription<S> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
