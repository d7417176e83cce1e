//! Analytics feed: keeps one snapshot per time range fresh in the background.

use super::{AnalyticsSource, AnalyticsState, TimeRange};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

/// Shared `{analytics, loading, error}` state per time range.
pub struct AnalyticsFeed<S> {
    source: Arc<S>,
    interval: Duration,
    states: Arc<RwLock<HashMap<TimeRange, AnalyticsState>>>,
    stop: Mutex<Option<broadcast::Sender<()>>>,
}

impl<S: AnalyticsSource> AnalyticsFeed<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self {
            source,
            interval,
            states: Arc::new(RwLock::new(HashMap::new())),
            stop: Mutex::new(None),
        }
    }

    /// Current state for `range`. Loading until the first refresh settles.
    pub async fn state(&self, range: TimeRange) -> AnalyticsState {
        self.states
            .read()
            .await
            .get(&range)
            .cloned()
            .unwrap_or_else(AnalyticsState::pending)
    }

    /// Recompute every range from the source.
    pub async fn refresh(&self) {
        refresh_all(self.source.as_ref(), &self.states).await;
    }

    /// Start the background refresh task. The first refresh runs one interval
    /// from now; call [`refresh`](Self::refresh) beforehand to fill the states.
    /// Does nothing if the task is already running.
    pub fn start(&self) {
        let mut stop = self.stop.lock().unwrap_or_else(|e| e.into_inner());
        if stop.is_some() {
            tracing::warn!("AnalyticsFeed: already running");
            return;
        }

        let (tx, mut rx) = broadcast::channel(1);
        *stop = Some(tx);

        let source = self.source.clone();
        let states = self.states.clone();
        let period = self.interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = rx.recv() => break,
                    _ = interval.tick() => {
                        refresh_all(source.as_ref(), &states).await;
                    }
                }
            }

            tracing::info!("AnalyticsFeed: stopped");
        });
    }

    /// Stop the background refresh task. The feed can be started again.
    pub async fn stop(&self) {
        let tx = self.stop.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
    }
}

async fn refresh_all<S: AnalyticsSource>(source: &S, states: &RwLock<HashMap<TimeRange, AnalyticsState>>) {
    for range in TimeRange::ALL {
        let result = source.snapshot(range);

        let mut states = states.write().await;
        let state = states.entry(range).or_insert_with(AnalyticsState::pending);
        state.loading = false;

        match result {
            Ok(snapshot) => {
                state.analytics = Some(snapshot);
                state.error = None;
            }
            Err(e) => {
                tracing::error!("AnalyticsFeed: Failed to refresh {} snapshot: {}", range.as_str(), e);
                state.error = Some(e.to_string());
            }
        }
    }
}
