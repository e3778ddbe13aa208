//! Rate Refresh Service
//!
//! Periodically pulls the reference rate table and republishes it through a
//! `tokio::sync::watch` channel. Readers either poll [`RefreshHandle::latest`]
//! or await changes on a subscribed receiver.
//!
//! The service owns its published state and shares nothing with the session
//! controller: feed failures never touch the throttle state.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, instrument, warn};

use exchange_rates::CurrencyCode;
use fx_types::{FetchError, RateFeed, RateFeedState, RateSnapshot};

/// Default refresh cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Refresh settings.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Currency the table is quoted against
    pub base: CurrencyCode,
    /// Time between refreshes (the first one runs immediately)
    pub interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            base: CurrencyCode::USD,
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

pub struct RateRefreshService<F: RateFeed> {
    feed: F,
    config: RefreshConfig,
    state: watch::Sender<RateFeedState>,
}

impl<F: RateFeed + 'static> RateRefreshService<F> {
    pub fn new(feed: F, config: RefreshConfig) -> Self {
        let (state, _) = watch::channel(RateFeedState::default());
        Self {
            feed,
            config,
            state,
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<RateFeedState> {
        self.state.subscribe()
    }

    /// The currently published state.
    pub fn latest(&self) -> RateFeedState {
        self.state.borrow().clone()
    }

    /// Runs one refresh and publishes the outcome.
    ///
    /// On success the snapshot is replaced wholesale. On failure the previous
    /// snapshot stays and the failure message is published next to it.
    #[instrument(skip(self), fields(base = %self.config.base))]
    pub async fn refresh_once(&self) -> Result<(), FetchError> {
        match self.feed.fetch(self.config.base).await {
            Ok(rates) => {
                info!("Fetched {} reference rates", rates.len());
                let snapshot = RateSnapshot::new(self.config.base, rates, Utc::now());
                self.state.send_modify(|state| state.record_success(snapshot));
                Ok(())
            }
            Err(e) => {
                warn!("Rate refresh failed, keeping previous snapshot: {}", e);
                self.state
                    .send_modify(|state| state.record_failure(&e, Utc::now()));
                Err(e)
            }
        }
    }

    /// Starts the periodic task. The first refresh runs immediately.
    pub fn spawn(self) -> RefreshHandle {
        let updates = self.subscribe();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(shutdown_rx));
        RefreshHandle {
            updates,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        info!(
            "Starting rate refresh for {} every {:?}",
            self.config.base, self.config.interval
        );
        // interval() panics on a zero period.
        let mut ticker = interval(self.config.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = self.refresh_once() => {}
                    }
                }
            }
        }

        info!("Rate refresh stopped");
    }
}

/// Handle to a running refresh task. Dropping it also stops the task.
pub struct RefreshHandle {
    updates: watch::Receiver<RateFeedState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// The currently published state.
    pub fn latest(&self) -> RateFeedState {
        self.updates.borrow().clone()
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<RateFeedState> {
        self.updates.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the timer and waits for the task to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = self.task.await {
            error!("Rate refresh task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use fx_types::RateTable;

    /// Feed returning scripted results, then repeating its fallback.
    struct MockFeed {
        results: Mutex<VecDeque<Result<RateTable, FetchError>>>,
        fallback: Result<RateTable, FetchError>,
        calls: Arc<Mutex<Vec<CurrencyCode>>>,
    }

    impl MockFeed {
        fn new(fallback: Result<RateTable, FetchError>) -> Self {
            Self {
                results: Mutex::new(VecDeque::new()),
                fallback,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn then(self, result: Result<RateTable, FetchError>) -> Self {
            self.results.lock().unwrap().push_back(result);
            self
        }
    }

    #[async_trait]
    impl RateFeed for MockFeed {
        async fn fetch(&self, base: CurrencyCode) -> Result<RateTable, FetchError> {
            self.calls.lock().unwrap().push(base);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    fn table(rates: &[(&str, f64)]) -> RateTable {
        rates.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn outage() -> FetchError {
        FetchError::NetworkFailure("HTTP 503 Service Unavailable".into())
    }

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let service = RateRefreshService::new(
            MockFeed::new(Ok(table(&[("EUR", 0.90)]))),
            RefreshConfig::default(),
        );

        service.refresh_once().await.unwrap();

        let state = service.latest();
        let snapshot = state.snapshot.unwrap();
        assert_eq!(snapshot.base, CurrencyCode::USD);
        assert_eq!(snapshot.rates["EUR"], 0.90);
        assert!(state.last_failure.is_none());
    }

    #[tokio::test]
    async fn test_failure_retains_previous_snapshot() {
        let feed = MockFeed::new(Err(outage())).then(Ok(table(&[("EUR", 0.90)])));
        let service = RateRefreshService::new(feed, RefreshConfig::default());

        service.refresh_once().await.unwrap();
        let before = service.latest().snapshot;

        let err = service.refresh_once().await.unwrap_err();

        let after = service.latest();
        assert_eq!(err, outage());
        assert_eq!(after.snapshot, before);
        assert!(after.is_stale());
        assert_eq!(
            after.last_failure.unwrap().message,
            "Rate feed request failed: HTTP 503 Service Unavailable"
        );
    }

    #[tokio::test]
    async fn test_uses_configured_base() {
        let feed = MockFeed::new(Ok(table(&[("USD", 0.024)])));
        let calls = feed.calls.clone();
        let service = RateRefreshService::new(
            feed,
            RefreshConfig {
                base: CurrencyCode::UAH,
                ..Default::default()
            },
        );

        service.refresh_once().await.unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![CurrencyCode::UAH]);
        assert_eq!(service.latest().snapshot.unwrap().base, CurrencyCode::UAH);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let service = RateRefreshService::new(
            MockFeed::new(Ok(table(&[("PLN", 3.95)]))),
            RefreshConfig::default(),
        );
        let mut rx = service.subscribe();

        service.refresh_once().await.unwrap();

        assert!(rx.has_changed().unwrap());
        let line = rx.borrow_and_update().display_line(CurrencyCode::PLN);
        assert_eq!(line, "Rate PLN: 3.9500");
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_task_runs_immediately_then_on_interval() {
        let feed = MockFeed::new(Ok(table(&[("EUR", 0.92)])));
        let calls = feed.calls.clone();
        let handle = RateRefreshService::new(feed, RefreshConfig::default()).spawn();

        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert!(handle.latest().snapshot.is_some());

        tokio::time::sleep(DEFAULT_REFRESH_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(calls.lock().unwrap().len(), 2);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timer() {
        let feed = MockFeed::new(Ok(table(&[("EUR", 0.92)])));
        let calls = feed.calls.clone();
        let handle = RateRefreshService::new(
            feed,
            RefreshConfig {
                interval: Duration::from_secs(10),
                ..Default::default()
            },
        )
        .spawn();

        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        handle.stop().await;

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_task() {
        let feed = MockFeed::new(Err(outage()));
        let service = RateRefreshService::new(feed, RefreshConfig::default());
        let handle = service.spawn();
        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        assert!(handle.latest().last_failure.is_some());

        drop(handle);
        // The sender lives in the task; the channel closes once it exits.
        assert!(rx.changed().await.is_err());
    }
}
